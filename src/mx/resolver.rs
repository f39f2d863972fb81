use std::io;
use std::time::Duration;

use trust_dns_resolver::{
    Resolver,
    error::{ResolveError, ResolveErrorKind},
    system_conf,
};

use super::{Error, MxRecord};

/// Builds a resolver from the system configuration. `timeout` bounds every
/// individual DNS query; `None` keeps the system default.
pub fn build_resolver(timeout: Option<Duration>) -> Result<Resolver, Error> {
    let (config, mut opts) = system_conf::read_system_conf()
        .map_err(|err| Error::resolver_init(io::Error::other(err)))?;
    if let Some(timeout) = timeout {
        opts.timeout = timeout;
    }
    Resolver::new(config, opts).map_err(Error::resolver_init)
}

/// Returns the hostname of the most preferred MX record for `domain`.
///
/// The domain is normalized via IDNA before querying DNS. Among the returned
/// records the lowest preference wins; ties keep the resolver's order.
pub fn resolve_mail_exchange<R>(resolver: &R, domain: &str) -> Result<String, Error>
where
    R: LookupMx + ?Sized,
{
    let ascii = normalize_domain(domain)?;
    tracing::debug!(domain = %ascii, "querying MX records");
    let records = resolver
        .lookup_mx(&ascii)
        .map_err(|err| Error::lookup(&ascii, err))?;
    let best = select_exchange(&ascii, records)?;
    tracing::info!(
        domain = %ascii,
        preference = best.preference,
        "mail exchange for {ascii} is {}",
        best.exchange
    );
    Ok(best.exchange)
}

pub(crate) fn select_exchange(domain: &str, mut records: Vec<MxRecord>) -> Result<MxRecord, Error> {
    // stable sort: equal preferences stay in resolver order
    records.sort_by_key(|record| record.preference);
    records
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoRecords {
            domain: domain.to_string(),
        })
}

pub(crate) fn normalize_domain(domain: &str) -> Result<String, Error> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(Error::idna)
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

/// Source of MX records. Implemented for the system [`Resolver`]; tests plug
/// in a stub.
pub trait LookupMx {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError>;
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        let lookup = match Resolver::mx_lookup(self, domain) {
            Ok(lookup) => lookup,
            Err(err) if matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        Ok(records)
    }
}

#[cfg(test)]
impl LookupMx for crate::mx::tests::StubResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        self.calls.set(self.calls.get() + 1);
        (self.on_lookup)(domain)
    }
}
