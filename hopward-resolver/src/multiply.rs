use std::net::Ipv4Addr;

use hopward_proto::packet::record::Record;

/// The synthetic TTL this core hands out for every `.multiply.` answer.
pub const MULTIPLY_TTL: u32 = 300;

/// A question name counts as a multiply query when it contains this infix.
pub const MULTIPLY_INFIX: &str = ".multiply.";

/// Splits the portion of `name` before `.multiply.` on `.`, keeps only
/// labels that parse as a non-negative decimal integer, and multiplies them
/// together modulo 256. Zero matching labels yields a product of 0.
pub fn product_mod_256(name: &str) -> u8 {
    let Some((prefix, _)) = name.split_once(MULTIPLY_INFIX) else {
        return 0;
    };

    prefix
        .split('.')
        .filter_map(|label| label.parse::<u32>().ok())
        .fold(None::<u32>, |acc, n| Some(acc.map_or(n, |acc| acc * n) % 256))
        .map(|product| product as u8)
        .unwrap_or(0)
}

/// Builds the synthesized answer record for a `.multiply.` query, with no
/// network egress: pure computation over the question name.
pub fn synthesize(name: &str) -> Record {
    let last_octet = product_mod_256(name);
    Record::A {
        domain: name.to_string(),
        addr: Ipv4Addr::new(127, 0, 0, last_octet),
        ttl: MULTIPLY_TTL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_numeric_labels_modulo_256() {
        assert_eq!(product_mod_256("3.4.multiply.example.com"), 12);
        assert_eq!(product_mod_256("10.30.multiply.example.com"), (300u32 % 256) as u8);
    }

    #[test]
    fn ignores_non_numeric_labels() {
        assert_eq!(product_mod_256("foo.5.multiply.example.com"), 5);
    }

    #[test]
    fn zero_numeric_labels_yields_zero() {
        assert_eq!(product_mod_256("foo.bar.multiply.example.com"), 0);
    }

    #[test]
    fn non_multiply_name_yields_zero() {
        assert_eq!(product_mod_256("example.com"), 0);
    }

    #[test]
    fn synthesizes_expected_record() {
        let record = synthesize("2.5.multiply.example.com");
        assert_eq!(
            record,
            Record::A {
                domain: "2.5.multiply.example.com".into(),
                addr: Ipv4Addr::new(127, 0, 0, 10),
                ttl: MULTIPLY_TTL,
            }
        );
    }
}
