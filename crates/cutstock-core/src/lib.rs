pub mod column_generation;
pub mod config;
pub mod data;
pub mod error;
pub mod lexer;
pub mod master;
pub mod parser;
pub mod plan;
pub mod pricing;

pub use column_generation::{ColumnGenerationOutcome, Solved, Termination, run_column_generation, solve};
pub use config::ColumnGenerationConfig;
pub use data::{DataError, Pattern, ProblemData};
pub use error::{CutStockError, MasterStage};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use master::{RelaxedMaster, solve_restricted_master};
pub use parser::{InputData, ParseError, Parser};
pub use plan::{CuttingPlan, PlanEntry, solve_final_master};
pub use pricing::{PricingResult, solve_pricing};

/// Parse and validate an input file's contents
pub fn parse_problem(source: &str) -> Result<ProblemData, CutStockError> {
    let input = Parser::parse(source)?;
    Ok(ProblemData::try_from(input)?)
}
