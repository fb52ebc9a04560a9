mod ambiguity;
mod closure;
mod delegation;
mod errors;
mod fixtures;
mod pipeline;
