//! Module for parsing Gene Protein Reaction strings into GPR trees

use crate::io::gpr_parse::parser::ParseError;
use crate::io::{Diagnostics, Warning};
use crate::metabolic_model::gene::{Gene, Gpr, GprOperatorType};
use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

mod lexer;
pub mod parser;
mod token;

use token::Token;

/// Parse a Gene Protein Reaction string into a pruned GPR Tree
///
/// # Parameters
/// - `input`: &str representing the gene protein reaction rule
/// - `gene_map`: map of gene id strings to genes, genes of the rule missing from it are
///   added once the rule parsed successfully
///
/// # Returns
/// Parse result which is
/// - `Ok`: The root node of the GPR tree
/// - `Err`: Returns the GprParseError describing the issue with the GPR rule which
///     was being parsed.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use gemrs_core::io::gpr_parse::parse_gpr;
/// let gpr: &str = "Rv0001 and Rv0002";
/// let mut gene_map = IndexMap::new();
/// let gpr_tree = parse_gpr(gpr, &mut gene_map).unwrap();
/// assert_eq!(gpr_tree.to_string_id(), "(Rv0001 and Rv0002)");
/// assert_eq!(gene_map.len(), 2);
/// ```
pub fn parse_gpr(input: &str, gene_map: &mut IndexMap<String, Gene>) -> Result<Gpr, GprParseError> {
    let tokens = lexer::Lexer::new(input).lex();
    let mut parser = parser::GPRParser::new(tokens);
    let gpr = parser
        .parse()?
        .prune()
        .ok_or(GprParseError::ParsingError(ParseError::ExpectedExpression))?;
    insert_genes(gene_map, gpr.genes());
    Ok(gpr)
}

/// Parse a Gene Protein Reaction string, never failing.
///
/// An empty rule means no gene association. A rule that cannot be parsed is read as an OR
/// of every gene identifier it contains, and a [`Warning::MalformedGeneRule`] is recorded.
pub fn parse_gpr_permissive(
    input: &str,
    gene_map: &mut IndexMap<String, Gene>,
    diagnostics: &mut Diagnostics,
) -> Option<Gpr> {
    if input.trim().is_empty() {
        return None;
    }
    match parse_gpr(input, gene_map) {
        Ok(gpr) => Some(gpr),
        Err(_) => {
            diagnostics.warn(Warning::MalformedGeneRule {
                rule: input.to_string(),
            });
            let genes: IndexSet<String> = lexer::Lexer::new(input)
                .lex()
                .into_iter()
                .filter_map(|token| match token {
                    Token::Identifier(id) => Some(id),
                    _ => None,
                })
                .collect();
            insert_genes(gene_map, genes.clone());
            Gpr::new_group(
                GprOperatorType::Or,
                genes.iter().map(|g| Gpr::new_gene_node(g)).collect(),
            )
            .prune()
        }
    }
}

/// Check if each gene id exists as a key in gene_map, if it doesn't insert a new gene with that id
fn insert_genes(gene_map: &mut IndexMap<String, Gene>, genes: IndexSet<String>) {
    for gene_id in genes {
        if !gene_map.contains_key(&gene_id) {
            let gene = Gene::new_id_only(&gene_id);
            gene_map.insert(gene_id, gene);
        }
    }
}

/// Enum representing possible parse errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GprParseError {
    /// Parsing Error
    #[error("Error occurred during parsing (conversion of tokens to GPR tree): {0}")]
    ParsingError(#[from] ParseError),
}
