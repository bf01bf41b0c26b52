/// Accepts `host:port` with or without a scheme and returns an `http://` or
/// `https://` URI.
pub(crate) fn address_str(
    addr: &str,
    tls: bool,
) -> String {
    let normalized = addr.trim_start_matches("http://").trim_start_matches("https://");
    let scheme = if tls { "https" } else { "http" };
    format!("{scheme}://{normalized}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_str_normalizes_scheme() {
        assert_eq!(address_str("127.0.0.1:5566", false), "http://127.0.0.1:5566");
        assert_eq!(address_str("http://node1:5566", false), "http://node1:5566");
        assert_eq!(address_str("http://node1:5566", true), "https://node1:5566");
    }
}
