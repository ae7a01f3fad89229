//! Ephemeral planner state: what the traveller currently sees

use crate::{TripClient, TripError, TripForm, TripResponse};
use tracing::debug;

/// Loading flag plus the outcome of the last submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerView {
    pub loading: bool,
    pub error: Option<String>,
    pub itinerary: Option<String>,
    pub days_inferred: Option<u64>,
    pub download_url: Option<String>,
}

impl PlannerView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit is disabled while a request is outstanding
    pub fn can_submit(&self, form: &TripForm) -> bool {
        !self.loading && form.can_submit()
    }

    /// Clear the previous outcome and enter the loading state
    pub fn begin(&mut self) {
        self.error = None;
        self.itinerary = None;
        self.days_inferred = None;
        self.download_url = None;
        self.loading = true;
    }

    /// Leave the loading state and show `outcome`
    pub fn apply(&mut self, outcome: Result<TripResponse, TripError>) {
        self.loading = false;
        match outcome {
            Ok(TripResponse::Itinerary { text, days_inferred }) => {
                self.itinerary = Some(text);
                self.days_inferred = days_inferred;
            }
            Ok(TripResponse::Error { message }) => {
                self.error = Some(message);
            }
            Ok(TripResponse::Download { url }) => {
                self.download_url = Some(url);
            }
            Err(e) => {
                debug!(error = %e, "Submission failed");
                self.error = Some(e.user_message().to_string());
            }
        }
    }

    /// Run one submission through `client`, updating the view before and after
    pub async fn submit(&mut self, client: &TripClient, form: &TripForm) {
        self.begin();
        let outcome = client.submit(form).await;
        self.apply(outcome);
    }
}
