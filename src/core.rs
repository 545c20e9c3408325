/*
 * This module consolidates the core, UI-independent logic of the application:
 * the `SourceFile` tree model, the background directory parser with its
 * progress handle, the selection and resolution resolver, and the settings
 * store. Filesystem access, parsing, resolution and settings are each reached
 * through an `...Operations` trait so the application layer can substitute
 * its own implementations.
 */
pub mod directory_parser;
pub mod parse_progress;
pub mod path_utils;
pub mod resolution_resolver;
pub mod settings;
pub mod source_file;
pub mod source_file_system;

// Re-export the tree model
pub use source_file::{NodeId, ResolutionError, SourceFile, SourceFileResolution};

// Re-export directory parsing
pub use directory_parser::{
    CoreDirectoryParser, DirectoryParserOperations, ParseCompletion, ParseOperation, ParsePoll,
    ParserConfig,
};
pub use parse_progress::{ParseProgress, ParseStats};
pub use source_file_system::{
    CoreSourceFileSystem, DirectoryEntry, EntryKind, SourceFileSystemOperations,
};

// Re-export resolution handling
pub use resolution_resolver::{
    CoreResolutionApplicator, MenuItemState, ResolutionApplicatorOperations, SelectionSnapshot,
    resolve_targets,
};

// Re-export settings
pub use settings::{
    CoreSettingsStore, DEFAULT_FONT_SIZE, InMemorySettings, SettingsError, SettingsOperations,
};
