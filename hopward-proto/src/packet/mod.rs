pub mod header;
pub mod question;
pub mod record;

use crate::buffer::{BytePacketBuffer, ReaderError, WriterError};

/// Record types this core understands on the wire. Anything else decodes to
/// `Unknown` and is never matched by question/answer logic, per the
/// "record types outside {A, NS, CNAME, AAAA}" Non-goal.
#[derive(PartialEq, Eq, Debug, Clone, Hash, Copy, serde::Serialize, serde::Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum QueryType {
    Unknown(u16),
    /// a host address
    A, // 1
    /// an authoritative name server
    NS, // 2
    /// the canonical name for an alias
    CNAME, // 5
    AAAA, // 28
}

impl QueryType {
    pub fn into_num(self) -> u16 {
        match self {
            QueryType::Unknown(x) => x,
            QueryType::A => 1,
            QueryType::NS => 2,
            QueryType::CNAME => 5,
            QueryType::AAAA => 28,
        }
    }

    pub fn from_num(num: u16) -> QueryType {
        match num {
            1 => QueryType::A,
            2 => QueryType::NS,
            5 => QueryType::CNAME,
            28 => QueryType::AAAA,
            _ => QueryType::Unknown(num),
        }
    }
}

/// A complete DNS message: the 12-byte header plus its four ordered record
/// sequences. Immutable once parsed, except that the server front-end
/// rewrites the id and flags of a cached response before re-serializing it.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct DnsPacket {
    pub header: header::Header,
    pub questions: Vec<question::Question>,
    pub answers: Vec<record::Record>,
    pub authorities: Vec<record::Record>,
    pub additionals: Vec<record::Record>,
}

impl TryFrom<BytePacketBuffer> for DnsPacket {
    type Error = ReaderError;

    fn try_from(mut buffer: BytePacketBuffer) -> Result<Self, Self::Error> {
        let header = header::Header::read(&mut buffer)?;

        let mut questions = Vec::with_capacity(header.questions as usize);
        for _ in 0..header.questions {
            questions.push(question::Question::read(&mut buffer)?);
        }

        let mut answers = Vec::with_capacity(header.answers as usize);
        for _ in 0..header.answers {
            answers.push(record::Record::read(&mut buffer)?);
        }

        let mut authorities = Vec::with_capacity(header.authoritative_entries as usize);
        for _ in 0..header.authoritative_entries {
            authorities.push(record::Record::read(&mut buffer)?);
        }

        let mut additionals = Vec::with_capacity(header.resource_entries as usize);
        for _ in 0..header.resource_entries {
            additionals.push(record::Record::read(&mut buffer)?);
        }

        Ok(DnsPacket {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }
}

impl DnsPacket {
    pub fn new(header: header::Header) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    pub fn with_question(mut self, question: question::Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn with_answer(mut self, record: record::Record) -> Self {
        self.answers.push(record);
        self
    }

    pub fn with_answers(mut self, records: Vec<record::Record>) -> Self {
        self.answers.extend(records);
        self
    }

    /// Builds a response envelope carrying `request`'s id and questions,
    /// with QR=1 and no answers yet. Matches §4.6's response-construction
    /// contract.
    pub fn response_from(request: &Self) -> Self {
        let mut header = header::Header::response_from(&request.header);
        header.questions = request.questions.len() as u16;
        Self {
            header,
            questions: request.questions.clone(),
            ..Default::default()
        }
    }

    pub fn create_buffer(&self) -> Result<BytePacketBuffer, WriterError> {
        let mut buffer = BytePacketBuffer::default();
        let mut header = self.header.clone();
        header.questions = self.questions.len() as u16;
        // `Unknown` records write zero bytes (there's no rdata to re-emit),
        // so they're excluded from the counts or the reparser would read a
        // phantom record off the next section's bytes.
        header.answers = count_emitted(&self.answers);
        header.authoritative_entries = count_emitted(&self.authorities);
        header.resource_entries = count_emitted(&self.additionals);

        header.write(&mut buffer)?;

        for question in &self.questions {
            question.write(&mut buffer)?;
        }
        for rec in &self.answers {
            rec.write(&mut buffer)?;
        }
        for rec in &self.authorities {
            rec.write(&mut buffer)?;
        }
        for rec in &self.additionals {
            rec.write(&mut buffer)?;
        }

        Ok(buffer)
    }
}

/// Counts the records that `Record::write` actually puts bytes on the wire
/// for. `Unknown` records are skipped at write time, so they don't count
/// towards a section's header count either.
fn count_emitted(records: &[record::Record]) -> u16 {
    records
        .iter()
        .filter(|record| !matches!(record, record::Record::Unknown { .. }))
        .count() as u16
}
