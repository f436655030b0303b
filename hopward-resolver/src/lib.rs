#[cfg(feature = "mock")]
pub mod mock;
pub mod multiply;
pub mod prelude;
pub mod transport;

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use hopward_proto::packet::question::Question;
use hopward_proto::packet::record::Record;
use hopward_proto::packet::{DnsPacket, QueryType};

use prelude::{Resolver, ResolverError};
use transport::{Transport, UdpTcpTransport};

/// Referral walks longer than this abort with `ResolverError::TooManyHops`
/// rather than looping forever on a misbehaving or adversarial authority.
const MAX_HOPS: usize = 16;

/// Resolves a question by walking the DNS hierarchy starting from a
/// configured root, following NS referrals (using glue when available) and
/// flattening CNAME chains, mirroring the teacher lineage's
/// `LookupService`/`RemoteLookupService` split but generalized into a loop
/// instead of a single forwarding hop. The transaction id counter mirrors
/// `LookupService`'s `AtomicU16`-backed `index` field, shared across every
/// hop and every concurrent request this resolver instance serves so ids
/// never collide or repeat predictably.
#[derive(Debug, Clone)]
pub struct IterativeResolver<T = UdpTcpTransport> {
    root_host: String,
    root_port: u16,
    transport: T,
    next_id: Arc<AtomicU16>,
}

impl IterativeResolver<UdpTcpTransport> {
    pub fn new(root_host: impl Into<String>, root_port: u16) -> Self {
        Self::with_transport(root_host, root_port, UdpTcpTransport)
    }
}

impl<T: Transport> IterativeResolver<T> {
    pub fn with_transport(root_host: impl Into<String>, root_port: u16, transport: T) -> Self {
        Self {
            root_host: root_host.into(),
            root_port,
            transport,
            next_id: Arc::new(AtomicU16::new(0)),
        }
    }

    fn find_answer<'a>(packet: &'a DnsPacket, question: &Question) -> Option<&'a Record> {
        packet.answers.iter().find(|record| {
            record.domain().eq_ignore_ascii_case(&question.name)
                && record_matches_type(record, question.qtype)
        })
    }

    fn find_cname<'a>(packet: &'a DnsPacket, question: &Question) -> Option<&'a Record> {
        packet.answers.iter().find(|record| {
            matches!(record, Record::CNAME { domain, .. } if domain.eq_ignore_ascii_case(&question.name))
        })
    }

    fn next_authority(packet: &DnsPacket) -> Option<String> {
        for authority in &packet.authorities {
            let Record::NS { domain, host, .. } = authority else {
                continue;
            };
            if domain.is_empty() {
                continue;
            }

            let glue = packet.additionals.iter().find_map(|record| match record {
                Record::A { domain: d, addr, .. } if d.eq_ignore_ascii_case(host) => {
                    Some(addr.to_string())
                }
                _ => None,
            });

            return Some(glue.unwrap_or_else(|| host.clone()));
        }
        None
    }

    async fn resolve_with_hops(
        &self,
        question: &Question,
        hops: usize,
    ) -> Result<DnsPacket, ResolverError> {
        if hops >= MAX_HOPS {
            return Err(ResolverError::TooManyHops);
        }

        let mut current_server = self.root_host.clone();
        let mut hop = hops;

        loop {
            if hop >= MAX_HOPS {
                return Err(ResolverError::TooManyHops);
            }
            hop += 1;

            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let request = DnsPacket::new(hopward_proto::packet::header::Header::question(id))
                .with_question(question.clone());
            let query_bytes = request
                .create_buffer()
                .map_err(|_| ResolverError::Malformed)?;

            let raw = self
                .transport
                .send(
                    &query_bytes.buf[..query_bytes.pos()],
                    &current_server,
                    self.root_port,
                    false,
                )
                .await
                .ok_or(ResolverError::Upstream)?;

            let buffer = hopward_proto::buffer::BytePacketBuffer::from_bytes(&raw)
                .map_err(|_| ResolverError::Malformed)?;
            let response =
                DnsPacket::try_from(buffer).map_err(|_| ResolverError::Malformed)?;

            if Self::find_answer(&response, question).is_some() {
                return Ok(response);
            }

            if let Some(cname) = Self::find_cname(&response, question) {
                let Record::CNAME { host, .. } = cname else {
                    unreachable!("find_cname only matches CNAME records")
                };
                let sub_question = Question::new(host.clone(), question.qtype);
                let resolved = Box::pin(self.resolve_with_hops(&sub_question, hop)).await;
                let mut flattened = resolved.unwrap_or_else(|_| request.clone());
                if flattened.questions.is_empty() {
                    flattened.questions.push(question.clone());
                } else {
                    flattened.questions[0].name = question.name.clone();
                }
                flattened.answers.insert(0, cname.clone());
                return Ok(flattened);
            }

            match Self::next_authority(&response) {
                Some(next) => current_server = next,
                None => return Ok(response),
            }
        }
    }
}

fn record_matches_type(record: &Record, qtype: QueryType) -> bool {
    matches!(
        (record, qtype),
        (Record::A { .. }, QueryType::A)
            | (Record::NS { .. }, QueryType::NS)
            | (Record::CNAME { .. }, QueryType::CNAME)
            | (Record::AAAA { .. }, QueryType::AAAA)
    )
}

#[async_trait::async_trait]
impl<T: Transport> Resolver for IterativeResolver<T> {
    async fn resolve(&self, question: &Question) -> Result<DnsPacket, ResolverError> {
        self.resolve_with_hops(question, 0).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopward_proto::buffer::BytePacketBuffer;
    use hopward_proto::packet::header::Header;
    use std::collections::HashMap;
    use std::net::Ipv4Addr;

    #[test]
    fn multiply_module_is_reexported() {
        assert_eq!(multiply::product_mod_256("2.3.multiply.x"), 6);
    }

    /// Upstream stand-in keyed by `(server, question name)`, so the same
    /// question asked of two different servers (a referral walk) and two
    /// different questions asked of the same server (CNAME recursion, which
    /// always restarts at the root) can both be scripted independently.
    #[derive(Debug, Default)]
    struct MockTransport {
        responses: HashMap<(String, String), DnsPacket>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self::default()
        }

        fn with_response(mut self, server: &str, question_name: &str, packet: DnsPacket) -> Self {
            self.responses
                .insert((server.to_string(), question_name.to_ascii_lowercase()), packet);
            self
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        async fn send(&self, query: &[u8], host: &str, _port: u16, _prefer_tcp: bool) -> Option<Vec<u8>> {
            let buffer = BytePacketBuffer::from_bytes(query).ok()?;
            let request = DnsPacket::try_from(buffer).ok()?;
            let name = request.questions.first()?.name.clone();
            let packet = self.responses.get(&(host.to_string(), name))?;
            let buf = packet.create_buffer().ok()?;
            Some(buf.buf[..buf.pos()].to_vec())
        }
    }

    #[tokio::test]
    async fn returns_the_answer_the_root_gives_directly() {
        let question = Question::new("example.com".into(), QueryType::A);
        let answer = Record::A {
            domain: "example.com".into(),
            addr: Ipv4Addr::new(93, 184, 216, 34),
            ttl: 60,
        };
        let reply = DnsPacket::new(Header::response(1))
            .with_question(question.clone())
            .with_answer(answer.clone());
        let transport = MockTransport::new().with_response("root.test", "example.com", reply);
        let resolver = IterativeResolver::with_transport("root.test", 53, transport);

        let result = resolver.resolve(&question).await.unwrap();
        assert_eq!(result.answers, vec![answer]);
    }

    #[tokio::test]
    async fn follows_an_ns_referral_using_glue_to_reach_the_final_answer() {
        let question = Question::new("sub.example.com".into(), QueryType::A);

        let mut referral = DnsPacket::new(Header::response(1)).with_question(question.clone());
        referral.authorities.push(Record::NS {
            domain: "sub.example.com".into(),
            host: "ns1.example.net".into(),
            ttl: 60,
        });
        referral.additionals.push(Record::A {
            domain: "ns1.example.net".into(),
            addr: Ipv4Addr::new(203, 0, 113, 7),
            ttl: 60,
        });

        let answer = Record::A {
            domain: "sub.example.com".into(),
            addr: Ipv4Addr::new(198, 51, 100, 9),
            ttl: 60,
        };
        let final_reply = DnsPacket::new(Header::response(2))
            .with_question(question.clone())
            .with_answer(answer.clone());

        let transport = MockTransport::new()
            .with_response("root.test", "sub.example.com", referral)
            .with_response("203.0.113.7", "sub.example.com", final_reply);
        let resolver = IterativeResolver::with_transport("root.test", 53, transport);

        let result = resolver.resolve(&question).await.unwrap();
        assert_eq!(result.answers, vec![answer]);
    }

    #[tokio::test]
    async fn flattens_a_cname_chain_back_onto_the_original_question() {
        let question = Question::new("www.example.com".into(), QueryType::A);
        let cname = Record::CNAME {
            domain: "www.example.com".into(),
            host: "example.com".into(),
            ttl: 60,
        };
        let cname_reply = DnsPacket::new(Header::response(1))
            .with_question(question.clone())
            .with_answer(cname.clone());

        let sub_question = Question::new("example.com".into(), QueryType::A);
        let answer = Record::A {
            domain: "example.com".into(),
            addr: Ipv4Addr::new(93, 184, 216, 34),
            ttl: 60,
        };
        let final_reply = DnsPacket::new(Header::response(2))
            .with_question(sub_question.clone())
            .with_answer(answer.clone());

        let transport = MockTransport::new()
            .with_response("root.test", "www.example.com", cname_reply)
            .with_response("root.test", "example.com", final_reply);
        let resolver = IterativeResolver::with_transport("root.test", 53, transport);

        let result = resolver.resolve(&question).await.unwrap();
        assert_eq!(result.questions[0].name, "www.example.com");
        assert_eq!(result.answers, vec![cname, answer]);
    }

    #[tokio::test]
    async fn gives_up_with_too_many_hops_on_an_endless_referral_chain() {
        let question = Question::new("loop.example.com".into(), QueryType::A);
        let mut referral = DnsPacket::new(Header::response(1)).with_question(question.clone());
        referral.authorities.push(Record::NS {
            domain: "loop.example.com".into(),
            host: "self.example.net".into(),
            ttl: 60,
        });
        referral.additionals.push(Record::A {
            domain: "self.example.net".into(),
            addr: Ipv4Addr::new(203, 0, 113, 99),
            ttl: 60,
        });

        let transport = MockTransport::new()
            .with_response("root.test", "loop.example.com", referral.clone())
            .with_response("203.0.113.99", "loop.example.com", referral);
        let resolver = IterativeResolver::with_transport("root.test", 53, transport);

        let err = resolver.resolve(&question).await.unwrap_err();
        assert_eq!(err, ResolverError::TooManyHops);
    }
}
