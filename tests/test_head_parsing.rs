use hijackhttp::types::{Header, ProtocolError};
use hijackhttp::utils::{ensure_user_agent, header_value, parse_header, parse_status_line};

#[test]
fn parse_status_line_variants() {
    let (status, protocol) = parse_status_line("HTTP/1.1 200 OK\r\n").unwrap();
    assert_eq!(status, 200);
    assert_eq!(protocol, "HTTP/1.1");

    let (status, protocol) = parse_status_line("HTTP/1.0 404 Not Found\r\n").unwrap();
    assert_eq!(status, 404);
    assert_eq!(protocol, "HTTP/1.0");

    // Reason phrase is optional
    let (status, _) = parse_status_line("HTTP/1.1 101\r\n").unwrap();
    assert_eq!(status, 101);
}

#[test]
fn parse_status_line_rejects_garbage() {
    assert!(matches!(
        parse_status_line("Invalid"),
        Err(ProtocolError::InvalidResponse(_))
    ));
    assert!(matches!(
        parse_status_line("HTTP/1.1 abc OK\r\n"),
        Err(ProtocolError::InvalidResponse(_))
    ));
    assert!(matches!(
        parse_status_line("200 OK HTTP/1.1\r\n"),
        Err(ProtocolError::InvalidResponse(_))
    ));
}

#[test]
fn parse_header_splits_on_first_colon() {
    let header = parse_header("Content-Type: text/plain\r\n").unwrap();
    assert_eq!(header.name, "Content-Type");
    assert_eq!(header.value.as_deref(), Some("text/plain"));

    let with_colon_value = parse_header("Location: http://example.com/a").unwrap();
    assert_eq!(with_colon_value.value.as_deref(), Some("http://example.com/a"));
}

#[test]
fn parse_header_edge_cases() {
    assert!(parse_header("   \r\n").is_none());

    let valueless = parse_header("X-Odd-Header").unwrap();
    assert_eq!(valueless.name, "X-Odd-Header");
    assert!(valueless.value.is_none());
}

#[test]
fn header_value_is_case_insensitive() {
    let headers = vec![
        Header::new("Upgrade", "rawbytes"),
        Header::new("Connection", "Upgrade"),
    ];
    assert_eq!(header_value(&headers, "upgrade"), Some("rawbytes"));
    assert_eq!(header_value(&headers, "UPGRADE"), Some("rawbytes"));
    assert_eq!(header_value(&headers, "missing"), None);
}

#[test]
fn ensure_user_agent_does_not_duplicate() {
    let mut headers = vec![Header::new("User-Agent", "custom/1.0")];
    ensure_user_agent(&mut headers);
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].value.as_deref(), Some("custom/1.0"));

    let mut empty = Vec::new();
    ensure_user_agent(&mut empty);
    assert_eq!(empty.len(), 1);
    assert!(empty[0].is("user-agent"));
}
