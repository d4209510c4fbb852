//! Cross-module tests for import, stats and clean.
