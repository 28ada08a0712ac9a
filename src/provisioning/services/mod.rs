mod stack_composer;

pub use stack_composer::StackComposer;
