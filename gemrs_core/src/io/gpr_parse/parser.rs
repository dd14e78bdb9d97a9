use crate::io::gpr_parse::token::Token;
use crate::metabolic_model::gene::{Gpr, GprOperatorType};

use thiserror::Error;

static EOF: Token = Token::Eof;
/*
GPR Grammar:
expression -> conjunction ("OR" conjunction)* ;
conjunction -> primary ("AND" primary)* ;
primary -> GENE | "(" expression ")" ;

e.g. ( Gene1 AND Gene2) OR (Gene3 AND Gene4)

Chains of the same operator become a single n-ary group.
 */

/// GPR Parser
pub struct GPRParser {
    /// Vector of tokens from the GPR string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
}

impl GPRParser {
    /// Create a new GPRParser
    pub fn new(tokens: Vec<Token>) -> GPRParser {
        GPRParser { tokens, current: 0 }
    }

    // region Parsing Functions

    /// Parse the token vector into a GPR tree
    pub fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.expression()?;
        if !self.is_at_end() {
            // If entire expression has not been parsed, and error has occured
            return Err(ParseError::EarlyTermination);
        }
        Ok(gpr)
    }

    fn expression(&mut self) -> Result<Gpr, ParseError> {
        let mut operands = vec![self.conjunction()?];
        while self.match_token(&Token::Or) {
            operands.push(self.conjunction()?);
        }
        Ok(GPRParser::combine(GprOperatorType::Or, operands))
    }

    fn conjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut operands = vec![self.primary()?];
        while self.match_token(&Token::And) {
            operands.push(self.primary()?);
        }
        Ok(GPRParser::combine(GprOperatorType::And, operands))
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        if let Some(identifier) = self.match_identifier() {
            return Ok(Gpr::new_gene_node(&identifier));
        }

        if self.match_token(&Token::LeftParen) {
            let expr = self.expression()?;
            self.consume(&Token::RightParen, "Expect ')' after expression.")?;
            return Ok(expr);
        }

        Err(ParseError::ExpectedExpression)
    }

    fn combine(kind: GprOperatorType, mut operands: Vec<Gpr>) -> Gpr {
        match operands.len() {
            1 => operands.remove(0),
            _ => Gpr::new_group(kind, operands),
        }
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the token at the current position matches `token`,
    /// if it does advance [`self.current`] and return true, otherwise return false
    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            return true;
        }
        false
    }

    /// Similar to [`match_token`], but for matching an identifier token. If the current
    /// token is an identifier return `Some(GeneId)`, where GeneId is the gene's string identifier,
    /// otherwise return None
    fn match_identifier(&mut self) -> Option<String> {
        if let Token::Identifier(id) = self.peek() {
            let id = id.clone();
            self.advance();
            return Some(id);
        }
        None
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        !self.is_at_end() && self.peek() == token
    }

    /// Advance `self.current` one position unless at end of the token Vec
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    /// Check whether the parser is at the end of the source Vec
    fn is_at_end(&self) -> bool {
        *self.peek() == Token::Eof
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&EOF)
    }

    /// Check whether the current token matches an input token, if it matches advance to the
    /// next token, and if it doesn't return an error. Used mainly for matching parenthesis in
    /// source GPR vec.
    fn consume(&mut self, token: &Token, msg: &str) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            return Ok(());
        }

        Err(ParseError::MissingToken(msg.to_string()))
    }

    // endregion parsing helper functions
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    /// Missing expected token (e.g. a right parenthesis)
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    /// No expression found when one was expected
    #[error("No expression found, check that the GPR string is not empty")]
    ExpectedExpression,
    /// Expression was not completed when parsing terminated
    #[error("Parsing terminated early, check for two gene identifiers without an operator between them")]
    EarlyTermination,
}
