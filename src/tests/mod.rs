//! Pipeline tests against a mock tab host and canned caption sources.

mod pipeline;
