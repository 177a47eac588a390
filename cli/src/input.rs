//! Address list input.

use std::io::BufRead;

/// Read one address per line, trimmed, stopping at the first blank line.
pub fn read_addresses<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut addresses = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        addresses.push(trimmed.to_string());
    }
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_blank_line() {
        let input = "0xaa\n  0xbb  \n\n0xcc\n";
        assert_eq!(read_addresses(input.as_bytes()).unwrap(), vec!["0xaa", "0xbb"]);
    }

    #[test]
    fn empty_input() {
        assert!(read_addresses("".as_bytes()).unwrap().is_empty());
        assert!(read_addresses("\n0xaa\n".as_bytes()).unwrap().is_empty());
    }
}
