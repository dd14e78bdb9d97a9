//! Module providing the Model struct for representing a metabolic model, and the entities it
//! owns.

pub mod annotation;
pub mod balance;
pub mod compartment;
pub mod events;
pub mod evidence;
pub mod gene;
pub mod metabolite;
pub mod model;
pub mod reaction;
pub mod reference;
pub mod test_case;
