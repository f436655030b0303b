use hopward_proto::packet::question::Question;
use hopward_proto::packet::DnsPacket;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolverError {
    /// A transport call to every tried authority returned no usable bytes.
    Upstream,
    /// The referral walk exceeded the configured hop cap without reaching
    /// an authoritative answer.
    TooManyHops,
    /// An upstream reply failed to parse as a well-formed message.
    Malformed,
}

impl std::fmt::Display for ResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream => write!(f, "no upstream server answered"),
            Self::TooManyHops => write!(f, "exceeded the referral hop cap"),
            Self::Malformed => write!(f, "upstream reply failed to parse"),
        }
    }
}

impl std::error::Error for ResolverError {}

#[async_trait::async_trait]
pub trait Resolver: std::fmt::Debug + Send + Sync {
    async fn resolve(&self, question: &Question) -> Result<DnsPacket, ResolverError>;
}
