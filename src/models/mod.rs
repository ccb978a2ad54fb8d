//! Concrete trial models.
//!
//! | Model | State | Trial | Absorbed when |
//! |-------|-------|-------|---------------|
//! | [`birthday::BirthdayModel`] | occupancy buckets | one person picks a slot uniformly | some slot holds `target` people |
//! | [`hit_streak::HitStreakModel`] | (hits, streak, reached) | one game of `m` at-bats | streak reached `target` games |
//! | [`innings::InningsModel`] | regulation, tied, won, lost | regulation, then one extra inning | the game is decided |

pub mod birthday;
pub mod hit_streak;
pub mod innings;
