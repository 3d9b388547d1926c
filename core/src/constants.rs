use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Signing headers shared by all service dialects.
pub const X_AMZ_CONTENT_SHA_256: &str = "x-amz-content-sha256";
pub const X_AMZ_DATE: &str = "x-amz-date";
pub const CONTENT_MD5: &str = "content-md5";

/// Prefix selecting the vendor headers that always join the signature.
pub const SIGNED_HEADER_PREFIX: &str = "x-amz-";

/// AsciiSet for URI path encoding.
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - The path separator '/' stays as-is.
pub static URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// AsciiSet for query string encoding, per RFC 3986 unreserved characters.
pub static QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
