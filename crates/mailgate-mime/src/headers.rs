//! Header decoding helpers.

use mailparse::{MailAddr, MailHeaderMap, SingleInfo};

/// Decodes RFC 2047 encoded words in a header value.
///
/// Values without encoded words are returned unchanged, as is anything
/// mailparse refuses.
#[must_use]
pub fn decode_header_value(raw: &str) -> String {
    if !raw.contains("=?") {
        return raw.to_string();
    }
    let line = format!("X: {raw}");
    match mailparse::parse_header(line.as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(_) => raw.to_string(),
    }
}

/// Formats a mailbox as `Name <address>`, or just the address.
#[must_use]
pub fn format_mailbox(name: Option<&str>, address: &str) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("{name} <{address}>"),
        None => address.to_string(),
    }
}

/// Returns the addresses of an address header, one formatted entry each.
///
/// Falls back to the decoded raw value when the header does not parse.
pub(crate) fn address_list(headers: &[mailparse::MailHeader<'_>], name: &str) -> Vec<String> {
    let Some(header) = headers.get_first_header(name) else {
        return Vec::new();
    };

    match mailparse::addrparse_header(header) {
        Ok(list) => list
            .iter()
            .flat_map(|addr| match addr {
                MailAddr::Single(single) => vec![format_single(single)],
                MailAddr::Group(group) => group.addrs.iter().map(format_single).collect(),
            })
            .collect(),
        Err(_) => vec![header.get_value()],
    }
}

fn format_single(info: &SingleInfo) -> String {
    format_mailbox(info.display_name.as_deref(), &info.addr)
}
