mod ambiguity;
mod closure;
mod enhance;
mod explicit;
mod finalize;
mod implement;
mod load;
mod rules;

pub use ambiguity::AmbiguityResolution;
pub use closure::ConversionClosure;
pub use enhance::InterfaceEnhancement;
pub use explicit::ExplicitMethods;
pub use finalize::Finalize;
pub use implement::ImplementMethods;
pub use load::{LoadClasses, LoadInterfaces};
pub use rules::ProductionRules;

use crate::Stage;

/// The standard chain, each stage directly after the one it requires.
pub fn standard() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(LoadInterfaces),
        Box::new(LoadClasses),
        Box::new(ProductionRules),
        Box::new(ExplicitMethods),
        Box::new(ConversionClosure),
        Box::new(InterfaceEnhancement),
        Box::new(ImplementMethods),
        Box::new(AmbiguityResolution),
        Box::new(Finalize),
    ]
}
