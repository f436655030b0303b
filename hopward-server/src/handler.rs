use std::collections::HashSet;
use std::sync::Arc;

use hopward_cache::Cache;
use hopward_proto::buffer::BytePacketBuffer;
use hopward_proto::packet::header::{Header, ResponseCode};
use hopward_proto::packet::question::Question;
use hopward_proto::packet::record::Record;
use hopward_proto::packet::DnsPacket;
use hopward_resolver::multiply;
use hopward_resolver::prelude::Resolver;

use crate::prelude::Handler;

enum QuestionOutcome {
    Records {
        answers: Vec<Record>,
        authorities: Vec<Record>,
        additionals: Vec<Record>,
    },
    ServerFailure,
}

/// Shared per-request handler driving both the UDP and TCP front-ends:
/// cache lookup, then the synthetic multiply handler, then the iterative
/// resolver, mirroring where the teacher lineage's `DnsHandler` decides
/// between cache and lookup.
pub struct DnsHandler<R> {
    cache: Arc<Cache>,
    resolver: Arc<R>,
}

impl<R: Resolver> DnsHandler<R> {
    pub fn new(cache: Arc<Cache>, resolver: Arc<R>) -> Self {
        Self { cache, resolver }
    }

    async fn answer_question(&self, question: &Question) -> QuestionOutcome {
        if let Some(cached) = self.cache.get(question) {
            return QuestionOutcome::Records {
                answers: cached.answers,
                authorities: cached.authorities,
                additionals: cached.additionals,
            };
        }

        if question.name.contains(multiply::MULTIPLY_INFIX) {
            let record = multiply::synthesize(&question.name);
            let mut response = DnsPacket::new(Header::response(0)).with_question(question.clone());
            response.answers.push(record.clone());
            self.cache
                .put(question.clone(), response, multiply::MULTIPLY_TTL);
            return QuestionOutcome::Records {
                answers: vec![record],
                authorities: Vec::new(),
                additionals: Vec::new(),
            };
        }

        match self.resolver.resolve(question).await {
            Ok(response) => {
                let ttl = response
                    .answers
                    .iter()
                    .map(Record::ttl)
                    .min()
                    .unwrap_or(multiply::MULTIPLY_TTL);
                self.cache.put(question.clone(), response.clone(), ttl);
                QuestionOutcome::Records {
                    answers: response.answers,
                    authorities: response.authorities,
                    additionals: response.additionals,
                }
            }
            Err(error) => {
                tracing::debug!(?error, name = %question.name, "resolver failed");
                QuestionOutcome::ServerFailure
            }
        }
    }

    async fn try_handle(&self, request: &DnsPacket) -> DnsPacket {
        let mut answers = HashSet::new();
        let mut authorities = HashSet::new();
        let mut additionals = HashSet::new();

        for question in &request.questions {
            match self.answer_question(question).await {
                QuestionOutcome::Records {
                    answers: a,
                    authorities: auth,
                    additionals: add,
                } => {
                    answers.extend(a);
                    authorities.extend(auth);
                    additionals.extend(add);
                }
                QuestionOutcome::ServerFailure => {
                    let mut response = DnsPacket::response_from(request);
                    response.header.response_code = ResponseCode::ServerFailure;
                    return response;
                }
            }
        }

        let mut response = DnsPacket::response_from(request);
        response.answers = answers.into_iter().collect();
        response.authorities = authorities.into_iter().collect();
        response.additionals = additionals.into_iter().collect();
        response
    }
}

#[async_trait::async_trait]
impl<R: Resolver> Handler for DnsHandler<R> {
    #[tracing::instrument(skip_all)]
    async fn handle(&self, request: &[u8]) -> Option<Vec<u8>> {
        let buffer = BytePacketBuffer::from_bytes(request).ok()?;
        let request = match DnsPacket::try_from(buffer) {
            Ok(packet) => packet,
            Err(error) => {
                tracing::debug!(?error, "dropping malformed request");
                return None;
            }
        };

        let response = self.try_handle(&request).await;
        let buffer = response.create_buffer().ok()?;
        Some(buffer.buf[..buffer.pos()].to_vec())
    }
}
