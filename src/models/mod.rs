pub mod conversation;
pub mod profile;

pub use conversation::{Conversation, Role, Turn, GREETING};
pub use profile::{
  day_name, DayPeriod, Equipment, Experience, FreeSlot, Gender, Profile, ProfileForm,
  DEFAULT_SESSION_MINUTES, MAX_SESSION_MINUTES, MIN_SESSION_MINUTES,
};
