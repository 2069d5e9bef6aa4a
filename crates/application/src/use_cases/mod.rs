mod synthesize_response;

pub use synthesize_response::{SynthesisOutcome, SynthesizeResponseUseCase, SynthesizedSections};
