//! Wire a custom transport into the client.
//!
//! Run with: cargo run --example custom_transport

use async_trait::async_trait;
use bytes::Bytes;
use cloudcall_core::sigv4::Signer;
use cloudcall_core::{
    Client, Credential, Evaluator, HttpSend, Request, ResponseFormat, Result, Service,
};
use http::Method;

/// A transport that never talks to the network: it prints the signed
/// request and answers with a canned document. Useful for inspecting what
/// would go on the wire.
#[derive(Debug)]
struct DryRunHttpSend;

#[async_trait]
impl HttpSend for DryRunHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        println!("{} {}", req.method(), req.uri());
        for (name, value) in req.headers() {
            println!("  {name}: {}", value.to_str().unwrap_or("<binary>"));
        }
        if !req.body().is_empty() {
            println!("  ({} body bytes)", req.body().len());
        }

        Ok(http::Response::builder()
            .status(200)
            .body(Bytes::from_static(b"{\"TableNames\":[]}"))
            .unwrap())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let service = Service::new(
        "dynamodb",
        "us-east-1",
        "https://dynamodb.us-east-1.amazonaws.com",
    )?;
    let credential = Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
    let client = Client::new(Signer::new(service, credential), DryRunHttpSend);

    let mut req = Request::server(Method::POST, client.service().endpoint())?;
    req.header(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/x-amz-json-1.0"),
    );
    req.body(cloudcall_core::Body::Text(r#"{"Limit":10}"#.to_string()));

    let out: serde_json::Value = client
        .send(req, &Evaluator::new(ResponseFormat::Json))
        .await?;
    println!("decoded: {out}");
    Ok(())
}
