//! External signal advisor port.

use crate::domain::advisor::{AdvisorRequest, AdvisorSignal};
use crate::domain::error::QuantError;

pub trait SignalAdvisor {
    fn advise(&self, request: &AdvisorRequest) -> Result<AdvisorSignal, QuantError>;
}
