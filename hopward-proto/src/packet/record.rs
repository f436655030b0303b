use super::QueryType;
use crate::buffer::reader::ReaderError;
use crate::buffer::writer::WriterError;
use crate::buffer::BytePacketBuffer;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A resource record. `ttl` is intentionally excluded from `Hash`/`Eq`: two
/// records that differ only in remaining lifetime identify the same fact, so
/// that a cached record and a freshly-resolved one dedupe correctly when a
/// response's answer set is built as a `HashSet`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Record {
    Unknown {
        domain: String,
        qtype: u16,
        ttl: u32,
    }, // 0
    A {
        domain: String,
        addr: Ipv4Addr,
        ttl: u32,
    }, // 1
    NS {
        domain: String,
        host: String,
        ttl: u32,
    }, // 2
    CNAME {
        domain: String,
        host: String,
        ttl: u32,
    }, // 5
    AAAA {
        domain: String,
        addr: Ipv6Addr,
        ttl: u32,
    }, // 28
}

impl Record {
    pub fn ttl(&self) -> u32 {
        match self {
            Self::A { ttl, .. } => *ttl,
            Self::AAAA { ttl, .. } => *ttl,
            Self::CNAME { ttl, .. } => *ttl,
            Self::NS { ttl, .. } => *ttl,
            Self::Unknown { ttl, .. } => *ttl,
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            Self::A { domain, .. } => domain,
            Self::AAAA { domain, .. } => domain,
            Self::CNAME { domain, .. } => domain,
            Self::NS { domain, .. } => domain,
            Self::Unknown { domain, .. } => domain,
        }
    }

    pub fn delayed_ttl(&self, ttl: u32) -> Self {
        match self {
            Self::A { domain, addr, .. } => Self::A {
                domain: domain.clone(),
                addr: *addr,
                ttl,
            },
            Self::AAAA { domain, addr, .. } => Self::AAAA {
                domain: domain.clone(),
                addr: *addr,
                ttl,
            },
            Self::CNAME { domain, host, .. } => Self::CNAME {
                domain: domain.clone(),
                host: host.clone(),
                ttl,
            },
            Self::NS { domain, host, .. } => Self::NS {
                domain: domain.clone(),
                host: host.clone(),
                ttl,
            },
            Self::Unknown { domain, qtype, .. } => Self::Unknown {
                domain: domain.clone(),
                qtype: *qtype,
                ttl,
            },
        }
    }

    pub fn read(buffer: &mut BytePacketBuffer) -> Result<Record, ReaderError> {
        let domain = buffer.read_qname()?;

        let qtype_num = buffer.read_u16()?;
        let qtype = QueryType::from_num(qtype_num);

        let _qclass = buffer.read_u16()?;

        let ttl = buffer.read_u32()?;

        let data_len = buffer.read_u16()?;

        match qtype {
            QueryType::A => {
                let raw_addr = buffer.read_u32()?;
                let addr = Ipv4Addr::new(
                    ((raw_addr >> 24) & 0xFF) as u8,
                    ((raw_addr >> 16) & 0xFF) as u8,
                    ((raw_addr >> 8) & 0xFF) as u8,
                    (raw_addr & 0xFF) as u8,
                );

                Ok(Record::A { domain, addr, ttl })
            }
            QueryType::AAAA => {
                let raw_addr1 = buffer.read_u32()?;
                let raw_addr2 = buffer.read_u32()?;
                let raw_addr3 = buffer.read_u32()?;
                let raw_addr4 = buffer.read_u32()?;
                let addr = Ipv6Addr::new(
                    ((raw_addr1 >> 16) & 0xFFFF) as u16,
                    (raw_addr1 & 0xFFFF) as u16,
                    ((raw_addr2 >> 16) & 0xFFFF) as u16,
                    (raw_addr2 & 0xFFFF) as u16,
                    ((raw_addr3 >> 16) & 0xFFFF) as u16,
                    (raw_addr3 & 0xFFFF) as u16,
                    ((raw_addr4 >> 16) & 0xFFFF) as u16,
                    (raw_addr4 & 0xFFFF) as u16,
                );

                Ok(Record::AAAA { domain, addr, ttl })
            }
            QueryType::NS => {
                let host = buffer.read_qname()?;

                Ok(Record::NS { domain, host, ttl })
            }
            QueryType::CNAME => {
                let host = buffer.read_qname()?;

                Ok(Record::CNAME { domain, host, ttl })
            }
            QueryType::Unknown(_) => {
                buffer.step(data_len as usize)?;

                Ok(Record::Unknown {
                    domain,
                    qtype: qtype_num,
                    ttl,
                })
            }
        }
    }

    /// Writes the record and returns the number of bytes emitted. `Unknown`
    /// records are dropped silently: there is no RDATA to re-emit for a type
    /// this core never parsed.
    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<usize, WriterError> {
        let start_pos = buffer.pos();

        match self {
            Record::A { domain, addr, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::A.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                buffer.write_u16(4)?;

                for octet in addr.octets() {
                    buffer.write_u8(octet)?;
                }
            }
            Record::NS { domain, host, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::NS.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;

                let pos = buffer.pos();
                buffer.write_u16(0)?;

                buffer.write_qname(host)?;

                let size = buffer.pos() - (pos + 2);
                buffer.set_u16(pos, size as u16)?;
            }
            Record::CNAME { domain, host, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::CNAME.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;

                let pos = buffer.pos();
                buffer.write_u16(0)?;

                buffer.write_qname(host)?;

                let size = buffer.pos() - (pos + 2);
                buffer.set_u16(pos, size as u16)?;
            }
            Record::AAAA { domain, addr, ttl } => {
                buffer.write_qname(domain)?;
                buffer.write_u16(QueryType::AAAA.into_num())?;
                buffer.write_u16(1)?;
                buffer.write_u32(*ttl)?;
                buffer.write_u16(16)?;

                for segment in addr.segments() {
                    buffer.write_u16(segment)?;
                }
            }
            Record::Unknown { domain, qtype, .. } => {
                tracing::debug!(domain, qtype, "skipping write of unknown record type");
            }
        }

        Ok(buffer.pos() - start_pos)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::A { domain, addr, .. }, Self::A { domain: d2, addr: a2, .. }) => {
                domain == d2 && addr == a2
            }
            (Self::NS { domain, host, .. }, Self::NS { domain: d2, host: h2, .. }) => {
                domain == d2 && host == h2
            }
            (
                Self::CNAME { domain, host, .. },
                Self::CNAME { domain: d2, host: h2, .. },
            ) => domain == d2 && host == h2,
            (Self::AAAA { domain, addr, .. }, Self::AAAA { domain: d2, addr: a2, .. }) => {
                domain == d2 && addr == a2
            }
            (
                Self::Unknown { domain, qtype, .. },
                Self::Unknown { domain: d2, qtype: q2, .. },
            ) => domain == d2 && qtype == q2,
            _ => false,
        }
    }
}

impl Eq for Record {}

impl std::hash::Hash for Record {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::A { domain, addr, .. } => {
                0u8.hash(state);
                domain.hash(state);
                addr.hash(state);
            }
            Self::NS { domain, host, .. } => {
                1u8.hash(state);
                domain.hash(state);
                host.hash(state);
            }
            Self::CNAME { domain, host, .. } => {
                2u8.hash(state);
                domain.hash(state);
                host.hash(state);
            }
            Self::AAAA { domain, addr, .. } => {
                3u8.hash(state);
                domain.hash(state);
                addr.hash(state);
            }
            Self::Unknown { domain, qtype, .. } => {
                4u8.hash(state);
                domain.hash(state);
                qtype.hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_roundtrip_a_record() {
        let record = Record::A {
            domain: "example.com".into(),
            addr: Ipv4Addr::new(93, 184, 216, 34),
            ttl: 300,
        };
        let mut buffer = BytePacketBuffer::default();
        record.write(&mut buffer).unwrap();
        buffer.step(0).unwrap();
        let mut reread = BytePacketBuffer::default();
        reread.buf = buffer.buf;
        let parsed = Record::read(&mut reread).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn should_roundtrip_cname_record() {
        let record = Record::CNAME {
            domain: "www.example.com".into(),
            host: "example.com".into(),
            ttl: 3600,
        };
        let mut buffer = BytePacketBuffer::default();
        record.write(&mut buffer).unwrap();
        buffer.step(0).unwrap();
        let mut reread = BytePacketBuffer::default();
        reread.buf = buffer.buf;
        let parsed = Record::read(&mut reread).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn equality_and_hash_ignore_ttl() {
        use std::collections::HashSet;

        let fresh = Record::A {
            domain: "example.com".into(),
            addr: Ipv4Addr::new(1, 2, 3, 4),
            ttl: 300,
        };
        let stale = fresh.delayed_ttl(12);

        assert_eq!(fresh, stale);

        let mut set = HashSet::new();
        set.insert(fresh);
        set.insert(stale);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn different_data_is_not_equal_even_with_same_ttl() {
        let a = Record::A {
            domain: "example.com".into(),
            addr: Ipv4Addr::new(1, 2, 3, 4),
            ttl: 300,
        };
        let b = Record::A {
            domain: "example.com".into(),
            addr: Ipv4Addr::new(5, 6, 7, 8),
            ttl: 300,
        };
        assert_ne!(a, b);
    }
}
