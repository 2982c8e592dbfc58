//! # Ordinary Petri nets with bounded places
//!
//! A net has places `P = {p1..pP}` and transitions `T = {t1..tT}`. Arcs are
//! given by two binary matrices `W_in, W_out ∈ {0,1}^{T×P}`, and every
//! transition has at least one input and one output place. A marking
//! `M ∈ [0, MAX_TOKENS]^P` holds the tokens.
//!
//! * `t` is **enabled** iff `∀p: M[p] ≥ W_in[t][p]`.
//! * `t` and `u` **conflict** iff `∃p: W_in[t][p] = W_in[u][p] = 1`.
//! * A **step** fires a maximal conflict-free subset `F` of the enabled
//!   transitions at once:
//!   `M'[p] = min(MAX_TOKENS, M[p] - Σ_{t∈F} W_in[t][p] + Σ_{t∈F} W_out[t][p])`.
//!   Tokens produced beyond capacity are dropped.
//!
//! ## Example
//!
//! ```rust
//! use petri_sim::net::{MAX_TOKENS, Marking, NetDefinition, ScriptedChooser, TransitionId};
//!
//! let net = NetDefinition::new(2, 1, &[vec![1, 0]], &[vec![0, 1]]).unwrap();
//! let mut marking = Marking::new(vec![1, 0], MAX_TOKENS).unwrap();
//! assert_eq!(net.enabled_transitions(&marking), vec![TransitionId::new(0)]);
//!
//! let outcome = net.step(&mut marking, &mut ScriptedChooser::default()).unwrap();
//! assert_eq!(outcome.fired(), &[TransitionId::new(0)]);
//! assert_eq!(marking.to_vec(), vec![0, 1]);
//! ```

pub mod core;
pub mod ids;
pub mod incidence;
pub mod index_vec;
pub mod io;
pub mod random;
pub mod structure;
pub mod text;

pub use self::core::{FireError, StepIntegrityError, StepOutcome};
pub use ids::{PlaceId, TransitionId};
pub use incidence::{IncidenceMatrix, MatrixKind};
pub use index_vec::{Idx, IndexVec};
pub use io::{IoError, NetSnapshot};
pub use random::{Chooser, ScriptedChooser, random_marking, random_topology};
pub use structure::{
    DimensionMismatchError, MAX_TOKENS, Marking, NetDefinition, StructureError, Tokens,
};
pub use text::FormatError;
