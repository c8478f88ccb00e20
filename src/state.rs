use std::sync::Arc;
use tokio::sync::Mutex;

use crate::llm::TextGenerator;
use crate::scoring::EquipmentWeights;
use crate::session::Session;

/// Application state shared by the command handlers: one session and the
/// generator that answers its questions
pub struct AppState {
  pub session: Mutex<Session>,
  pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
  pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
    Self::with_weights(generator, EquipmentWeights::default())
  }

  pub fn with_weights(generator: Arc<dyn TextGenerator>, weights: EquipmentWeights) -> Self {
    Self {
      session: Mutex::new(Session::with_weights(weights)),
      generator,
    }
  }
}
