//! Parse raw HTTP response header lines collected from curl.

/// Turn raw header lines into `(name, value)` pairs.
///
/// Redirects produce several header blocks; every `HTTP/` status line starts
/// a new block, so only the final response's headers are kept.
pub fn parse_header_lines(lines: &[String]) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_name_value_pairs() {
        let lines = [
            "HTTP/1.1 200 OK".to_string(),
            "Content-Type: text/html; charset=utf-8".to_string(),
            "Server: nginx".to_string(),
            "".to_string(),
        ];
        let h = parse_header_lines(&lines);
        assert_eq!(h.len(), 2);
        assert_eq!(h[0], ("Content-Type".into(), "text/html; charset=utf-8".into()));
        assert_eq!(h[1], ("Server".into(), "nginx".into()));
    }

    #[test]
    fn parse_keeps_only_final_block_after_redirect() {
        let lines = [
            "HTTP/1.1 301 Moved Permanently".to_string(),
            "Location: /admin/".to_string(),
            "".to_string(),
            "HTTP/1.1 200 OK".to_string(),
            "Content-Length: 12".to_string(),
        ];
        let h = parse_header_lines(&lines);
        assert_eq!(h, vec![("Content-Length".to_string(), "12".to_string())]);
    }
}
