use std::collections::HashMap;

use hopward_proto::packet::question::Question;
use hopward_proto::packet::DnsPacket;

use crate::prelude::{Resolver, ResolverError};

#[derive(Debug, Default)]
pub struct MockResolver {
    responses: HashMap<Question, DnsPacket>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, question: Question, packet: DnsPacket) -> Self {
        self.responses.insert(question, packet);
        self
    }
}

#[async_trait::async_trait]
impl Resolver for MockResolver {
    async fn resolve(&self, question: &Question) -> Result<DnsPacket, ResolverError> {
        self.responses
            .get(question)
            .cloned()
            .ok_or(ResolverError::Upstream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopward_proto::packet::header::Header;
    use hopward_proto::packet::QueryType;

    #[tokio::test]
    async fn returns_configured_response() {
        let question = Question::new("example.com".into(), QueryType::A);
        let packet = DnsPacket::new(Header::response(1)).with_question(question.clone());
        let resolver = MockResolver::new().with_response(question.clone(), packet.clone());

        let found = resolver.resolve(&question).await.unwrap();
        assert_eq!(found.header.id, packet.header.id);
    }

    #[tokio::test]
    async fn errors_on_unknown_question() {
        let resolver = MockResolver::new();
        let question = Question::new("unknown.example".into(), QueryType::A);
        let err = resolver.resolve(&question).await.unwrap_err();
        assert_eq!(err, ResolverError::Upstream);
    }
}
