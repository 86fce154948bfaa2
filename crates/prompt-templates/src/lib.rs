//! Static tier × analysis-type prompt templates and output schemas.

pub mod catalog;
pub mod generate;
pub mod schema;

pub use catalog::{template, FewShotExample, PromptTemplate};
pub use generate::{generate_prompt, required_output_fields};
pub use schema::{enterprise_schema, professional_schema, required_fields, schema_for};
