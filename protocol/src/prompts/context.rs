// Context Prompts
// Instruction text embedded next to attached docs, blocks and themes

pub const DOC_INSTRUCTIONS: &str =
  "The user has selected the following documentation for reference. Please use context7.";

pub const BLOCK_INSTRUCTIONS_HEADER: &str = "The user has selected the following UI components/blocks as reference for achieving their goal.\nUse the selected Components/blocks to best achieve the user's goal.";

/// Numbered steps following the block header. The first step is completed
/// with the block's installation command.
pub const BLOCK_INSTALL_STEP: &str =
  "Install the block in the codebase using the provided installation command.";

pub const BLOCK_FOLLOW_UP_STEPS: [&str; 3] = [
  "Once installed, refer to the user's project structure and integrate the block appropriately or as instructed by the user.",
  "You can use this code as reference to adapt and implement similar functionality in the user's project.",
  "Follow best practices and coding patterns demonstrated in these blocks.",
];

pub const THEME_INSTRUCTIONS_HEADER: &str =
  "The user has selected the following theme so you have to install the theme by following the steps.";

pub const THEME_INSTALL_STEP: &str =
  "Install the theme in the codebase using the provided installation command.";

pub const THEME_FOLLOW_UP_STEPS: [&str; 2] = [
  "Once installed, refer to the user's project structure and integrate the theme appropriately or as instructed by the user.",
  "You can use this theme as reference to adapt and implement similar styling in the user's project.",
];
