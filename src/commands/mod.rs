pub mod apply;
pub mod check;
pub mod list;
pub mod preview;

/// Parse repeated `-d key=value` flags, ignoring malformed entries.
pub fn parse_data_pairs(data: Vec<String>) -> Vec<(String, String)> {
    data.into_iter()
        .filter_map(|kv| {
            let mut parts = kv.splitn(2, '=');
            let key = parts.next()?.to_string();
            let value = parts.next()?.to_string();
            Some((key, value))
        })
        .collect()
}
