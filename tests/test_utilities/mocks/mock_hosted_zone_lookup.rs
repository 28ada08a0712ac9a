use async_trait::async_trait;
use cms_stack::prelude::*;
use cms_stack::shared::error::StackError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock HostedZoneLookup backed by a fixed set of public zones
#[derive(Default, Clone)]
pub struct MockHostedZoneLookup {
    zones: HashMap<String, String>,
    pub lookups: Arc<Mutex<Vec<String>>>,
}

impl MockHostedZoneLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, name: &str, id: &str) -> Self {
        self.zones.insert(name.to_string(), id.to_string());
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }
}

#[async_trait]
impl HostedZoneLookup for MockHostedZoneLookup {
    async fn find_public_zone(&self, domain: &DomainName) -> Result<HostedZone> {
        self.lookups.lock().unwrap().push(domain.to_string());
        match self.zones.get(domain.as_str()) {
            Some(id) => HostedZone::new(id, domain.clone()),
            None => Err(StackError::HostedZoneNotFound {
                domain: domain.to_string(),
                details: "no public hosted zone with that exact name".to_string(),
            }
            .into()),
        }
    }
}
