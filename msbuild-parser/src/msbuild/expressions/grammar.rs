//! Expression grammar
//!
//! The grammar is a set of chumsky rules over the [`ExprToken`] stream. Alternatives are
//! ordered: the first one that succeeds wins, there is no ambiguity resolution beyond that.
//! Every rule attaches its span with `map_with_span`, so position bookkeeping lives next to
//! node construction and rules stay side-effect free.
//!
//! Rules are exposed individually through [`Rules`] so callers (and tests) can parse a
//! fragment as a specific construct:
//!
//! ```text
//! root                 := ws (grouped | expression | quoted_string) ws EOF
//! expression           := or
//! or                   := and (Or and)*
//! and                  := unary (And unary)*
//! unary                := (Not | '!') unary | primary
//! primary              := grouped | comparison | function_call | item_group_transform
//!                         | item_group | item_metadata | quoted_string | evaluate | symbol
//! comparison           := operand ('==' | '!=') operand
//! operand              := quoted_string | evaluate | symbol
//! evaluate             := '$(' (function_call | symbol) ')'
//! item_group           := '@(' symbol? ')'
//! item_group_transform := '@(' symbol '->' (quoted_string (',' quoted_string_literal)?)? ')'
//! item_metadata        := '%(' ((symbol '.' name?) | symbol)? ')'
//! function_call        := static_call | instance_call | global_call
//! static_call          := '[' type ']' '::' identifier arguments
//! instance_call        := symbol '.' identifier arguments
//! global_call          := identifier arguments
//! arguments            := '(' ((number | expression) (',' (number | expression))*)? ')'
//! number               := '-'? digits ('.' digits)?
//! quoted_string        := "'" (evaluate | item_metadata | item_group | plain)* "'"
//! list                 := item? (';' item?)*
//! simple_list          := text (';' text)*
//! ```
//!
//! Whitespace is allowed between the parts of a construct, but never inside brackets of a
//! type reference.

use chumsky::prelude::*;
use chumsky::Stream;
use std::ops::Range;

use super::ast::{ComparisonKind, Expr, ExprKind, FunctionKind, LogicalOperator};
use super::lexer::{tokenize, ExprToken};

pub type ParserError = Simple<ExprToken>;

pub type Rule<'a, O> = BoxedParser<'a, ExprToken, O, ParserError>;

/// The span of a list separator's `;` and the span of the whole separator node.
pub type SeparatorSpans = (Range<usize>, Range<usize>);

/// Raw output of the `list` rule, before empty slots are materialised.
#[derive(Debug, Clone)]
pub struct ListParts {
    pub first: Option<Expr>,
    pub rest: Vec<(SeparatorSpans, Option<Expr>)>,
}

/// Every grammar rule, ready to run.
#[derive(Clone)]
pub struct Rules<'a> {
    pub root: Rule<'a, Expr>,
    pub expression: Rule<'a, Expr>,
    pub logical: Rule<'a, Expr>,
    pub comparison: Rule<'a, Expr>,
    pub grouped: Rule<'a, Expr>,
    pub symbol: Rule<'a, Expr>,
    pub type_ref: Rule<'a, Expr>,
    pub quoted_string: Rule<'a, Expr>,
    pub quoted_string_literal: Rule<'a, Expr>,
    pub evaluate: Rule<'a, Expr>,
    pub item_group: Rule<'a, Expr>,
    pub item_group_transform: Rule<'a, Expr>,
    pub item_metadata: Rule<'a, Expr>,
    pub function_call: Rule<'a, Expr>,
    pub global_call: Rule<'a, Expr>,
    pub instance_call: Rule<'a, Expr>,
    pub static_call: Rule<'a, Expr>,
    pub argument_list: Rule<'a, Vec<Expr>>,
    pub list: Rule<'a, ListParts>,
    pub simple_list: Rule<'a, Vec<Range<usize>>>,
}

impl<'a> Rules<'a> {
    pub fn new() -> Self {
        let expression =
            recursive(|expression| Self::with_expression(expression.boxed()).expression);
        Self::with_expression(expression.boxed())
    }

    /// Build every rule around `expression`, the parser used wherever the grammar recurses
    /// (function arguments and parenthesised groups).
    fn with_expression(expression: Rule<'a, Expr>) -> Self {
        use ExprToken::*;

        let argument_list = just(OpenParen)
            .ignore_then(ws())
            .ignore_then(
                number()
                    .or(expression.clone())
                    .then_ignore(ws())
                    .separated_by(just(Comma).then_ignore(ws())),
            )
            .then_ignore(just(CloseParen))
            .labelled("argument list")
            .boxed();

        let global_call = identifier()
            .then(argument_list.clone())
            .map_with_span(|(name, arguments), span| {
                Expr::node(
                    ExprKind::FunctionCall {
                        name,
                        function: FunctionKind::Global,
                    },
                    span,
                    arguments,
                )
            })
            .boxed();

        let instance_call = symbol()
            .then_ignore(just(Period))
            .then(identifier())
            .then(argument_list.clone())
            .map_with_span(|((target, name), arguments), span| {
                call_with_target(name, FunctionKind::InstanceMethod, target, arguments, span)
            })
            .boxed();

        let static_call = type_ref()
            .then_ignore(just(DoubleColon))
            .then(identifier())
            .then(argument_list.clone())
            .map_with_span(|((target, name), arguments), span| {
                call_with_target(name, FunctionKind::StaticMethod, target, arguments, span)
            })
            .boxed();

        let function_call = choice((
            static_call.clone(),
            instance_call.clone(),
            global_call.clone(),
        ))
        .labelled("function call")
        .boxed();

        let evaluate = just(EvaluateOpen)
            .ignore_then(ws())
            .ignore_then(choice((function_call.clone(), symbol().boxed())))
            .then_ignore(ws())
            .then_ignore(just(CloseParen))
            .map_with_span(|inner, span| Expr::node(ExprKind::Evaluate, span, vec![inner]))
            .labelled("property reference")
            .boxed();

        let item_group = just(ItemGroupOpen)
            .ignore_then(ws())
            .ignore_then(symbol().or_not())
            .then_ignore(ws())
            .then_ignore(just(CloseParen))
            .map_with_span(|name, span| {
                Expr::node(ExprKind::ItemGroup, span, name.into_iter().collect())
            })
            .labelled("item reference")
            .boxed();

        let item_metadata = item_metadata();

        let plain = filter(|token: &ExprToken| {
            !matches!(token, Quote | EvaluateOpen | ItemMetadataOpen | ItemGroupOpen)
        })
        .repeated()
        .at_least(1)
        .map_with_span(|tokens: Vec<ExprToken>, span| {
            Expr::leaf(
                ExprKind::StringContent {
                    content: decode(&tokens),
                },
                span,
            )
        });

        let quoted_string = just(Quote)
            .ignore_then(
                choice((
                    evaluate.clone(),
                    item_metadata.clone(),
                    item_group.clone(),
                    plain.boxed(),
                ))
                .repeated(),
            )
            .then_ignore(just(Quote))
            .map_with_span(|children, span| Expr::node(ExprKind::QuotedString, span, children))
            .labelled("quoted string")
            .boxed();

        let transform_separator = ws()
            .ignore_then(just(Comma))
            .ignore_then(ws())
            .ignore_then(quoted_string_literal());

        let item_group_transform = just(ItemGroupOpen)
            .ignore_then(ws())
            .ignore_then(symbol())
            .then_ignore(ws())
            .then_ignore(just(Arrow))
            .then_ignore(ws())
            .then(
                quoted_string
                    .clone()
                    .then(transform_separator.or_not())
                    .or_not(),
            )
            .then_ignore(ws())
            .then_ignore(just(CloseParen))
            .map_with_span(|(name, body), span| {
                let mut children = vec![name];
                if let Some((body, separator)) = body {
                    children.push(body);
                    children.extend(separator);
                }
                Expr::node(ExprKind::ItemGroupTransform, span, children)
            })
            .labelled("item transform")
            .boxed();

        let operand = choice((quoted_string.clone(), evaluate.clone(), symbol().boxed()));
        let comparison_operator = choice((
            just(Equals).to(ComparisonKind::Equality),
            just(NotEquals).to(ComparisonKind::Inequality),
        ));
        let comparison = operand
            .clone()
            .then_ignore(ws())
            .then(comparison_operator)
            .then_ignore(ws())
            .then(operand)
            .map_with_span(|((left, comparison), right), span| {
                Expr::node(ExprKind::Comparison { comparison }, span, vec![left, right])
            })
            .labelled("comparison")
            .boxed();

        // Parentheses fold into the node they wrap, widening its span.
        let grouped = just(OpenParen)
            .ignore_then(ws())
            .ignore_then(expression.clone())
            .then_ignore(ws())
            .then_ignore(just(CloseParen))
            .map_with_span(|inner: Expr, span| inner.with_span(span))
            .labelled("group")
            .boxed();

        let primary = choice((
            grouped.clone(),
            comparison.clone(),
            function_call.clone(),
            item_group_transform.clone(),
            item_group.clone(),
            item_metadata.clone(),
            quoted_string.clone(),
            evaluate.clone(),
            symbol().boxed(),
        ))
        .boxed();

        let unary = recursive(|unary| {
            choice((just(Bang).ignored(), keyword("not")))
                .then_ignore(ws())
                .ignore_then(unary)
                .map_with_span(|operand, span| {
                    Expr::node(
                        ExprKind::Logical {
                            operator: LogicalOperator::Not,
                        },
                        span,
                        vec![operand],
                    )
                })
                .or(primary)
        })
        .boxed();

        let and_chain = unary
            .clone()
            .then(
                ws().ignore_then(keyword("and"))
                    .ignore_then(ws())
                    .ignore_then(unary)
                    .repeated(),
            )
            .foldl(|left, right| Expr::logical(LogicalOperator::And, left, right))
            .boxed();

        let or_chain = and_chain
            .clone()
            .then(
                ws().ignore_then(keyword("or"))
                    .ignore_then(ws())
                    .ignore_then(and_chain)
                    .repeated(),
            )
            .foldl(|left, right| Expr::logical(LogicalOperator::Or, left, right))
            .boxed();

        let logical = or_chain
            .clone()
            .try_map(|expr, span| match expr.kind {
                ExprKind::Logical { .. } => Ok(expr),
                _ => Err(Simple::custom(span, "expected a logical expression")),
            })
            .boxed();

        let root = ws()
            .ignore_then(choice((
                grouped.clone().then_ignore(ws()).then_ignore(end()),
                or_chain.clone().then_ignore(ws()).then_ignore(end()),
                quoted_string.clone().then_ignore(ws()).then_ignore(end()),
            )))
            .boxed();

        let separator = ws()
            .ignore_then(just(Semicolon).map_with_span(|_, span: Range<usize>| span))
            .then_ignore(ws())
            .map_with_span(|semicolon, span: Range<usize>| (semicolon, span));
        let list_item = ws().ignore_then(or_chain.clone()).or_not();
        let list = list_item
            .clone()
            .then(separator.then(list_item).repeated())
            .then_ignore(ws())
            .map(|(first, rest)| ListParts { first, rest })
            .boxed();

        let list_text = filter(|token: &ExprToken| *token != Semicolon).repeated();
        let simple_list = list_text
            .clone()
            .ignore_then(
                just(Semicolon)
                    .map_with_span(|_, span: Range<usize>| span)
                    .then_ignore(list_text)
                    .repeated(),
            )
            .boxed();

        Self {
            root,
            expression: or_chain,
            logical,
            comparison,
            grouped,
            symbol: symbol().boxed(),
            type_ref: type_ref().boxed(),
            quoted_string,
            quoted_string_literal: quoted_string_literal().boxed(),
            evaluate,
            item_group,
            item_group_transform,
            item_metadata,
            function_call,
            global_call,
            instance_call,
            static_call,
            argument_list,
            list,
            simple_list,
        }
    }
}

impl Default for Rules<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `parser` over the whole of `source`.
pub fn parse_with<O>(
    parser: impl Parser<ExprToken, O, Error = ParserError>,
    source: &str,
) -> Result<O, Vec<ParserError>> {
    let length = source.chars().count();
    let tokens = tokenize(source);
    parser
        .then_ignore(end())
        .parse(Stream::from_iter(length..length, tokens.into_iter()))
}

fn ws() -> impl Parser<ExprToken, (), Error = ParserError> + Clone {
    filter(ExprToken::is_whitespace).repeated().ignored()
}

fn identifier() -> impl Parser<ExprToken, String, Error = ParserError> + Clone {
    select! { ExprToken::Identifier(name) => name }.labelled("identifier")
}

fn keyword(word: &'static str) -> impl Parser<ExprToken, (), Error = ParserError> + Clone {
    filter(move |token: &ExprToken| token.is_keyword(word))
        .ignored()
        .labelled(word)
}

fn symbol() -> impl Parser<ExprToken, Expr, Error = ParserError> + Clone {
    identifier().map_with_span(|name, span| Expr::leaf(ExprKind::symbol(name), span))
}

fn digits() -> impl Parser<ExprToken, String, Error = ParserError> + Clone {
    select! { ExprToken::Number(digits) => digits }
}

/// A numeric literal; only function arguments accept one.
fn number() -> impl Parser<ExprToken, Expr, Error = ParserError> + Clone {
    just(ExprToken::Other('-'))
        .or_not()
        .then(digits())
        .then(just(ExprToken::Period).ignore_then(digits()).or_not())
        .map_with_span(|((sign, whole), fraction), span| {
            let mut value = String::new();
            if sign.is_some() {
                value.push('-');
            }
            value.push_str(&whole);
            if let Some(fraction) = fraction {
                value.push('.');
                value.push_str(&fraction);
            }
            Expr::leaf(ExprKind::Number { value }, span)
        })
        .labelled("number")
}

/// `[Namespace.Type]` as a qualified symbol.
fn type_ref() -> impl Parser<ExprToken, Expr, Error = ParserError> + Clone {
    just(ExprToken::OpenBracket)
        .ignore_then(
            identifier()
                .separated_by(just(ExprToken::Period))
                .at_least(1),
        )
        .then_ignore(just(ExprToken::CloseBracket))
        .map_with_span(|mut segments: Vec<String>, span| {
            let name = segments.pop().unwrap_or_default();
            Expr::leaf(
                ExprKind::Symbol {
                    name,
                    namespace: segments.join("."),
                },
                span,
            )
        })
        .labelled("type reference")
}

fn quoted_string_literal() -> impl Parser<ExprToken, Expr, Error = ParserError> + Clone {
    just(ExprToken::Quote)
        .ignore_then(filter(|token: &ExprToken| *token != ExprToken::Quote).repeated())
        .then_ignore(just(ExprToken::Quote))
        .map_with_span(|tokens: Vec<ExprToken>, span| {
            Expr::leaf(
                ExprKind::QuotedStringLiteral {
                    content: decode(&tokens),
                },
                span,
            )
        })
        .labelled("string literal")
}

/// `%(Name)`, `%(Type.Name)`, and the partial forms typed on the way there: `%()`,
/// `%(Type.)` (zero-length name) and `%(Type. )` (whitespace name).
fn item_metadata<'a>() -> Rule<'a, Expr> {
    let name = symbol().or(filter(ExprToken::is_whitespace)
        .map_with_span(|token: ExprToken, span| Expr::leaf(ExprKind::symbol(token.to_string()), span)));

    let qualified = symbol()
        .then_ignore(ws())
        .then(just(ExprToken::Period).map_with_span(|_, span: Range<usize>| span))
        .then(name.or_not())
        .map(|((item_type, period), name)| {
            let name = name.unwrap_or_else(|| {
                Expr::leaf(ExprKind::symbol(""), period.end..period.end)
            });
            vec![item_type, name]
        });
    let unqualified = symbol().map(|name| vec![name]);

    just(ExprToken::ItemMetadataOpen)
        .ignore_then(ws())
        .ignore_then(qualified.or(unqualified).or_not())
        .then_ignore(ws())
        .then_ignore(just(ExprToken::CloseParen))
        .map_with_span(|children, span| {
            Expr::node(ExprKind::ItemMetadata, span, children.unwrap_or_default())
        })
        .labelled("metadata reference")
        .boxed()
}

fn call_with_target(
    name: String,
    function: FunctionKind,
    target: Expr,
    arguments: Vec<Expr>,
    span: Range<usize>,
) -> Expr {
    let mut children = Vec::with_capacity(arguments.len() + 1);
    children.push(target);
    children.extend(arguments);
    Expr::node(ExprKind::FunctionCall { name, function }, span, children)
}

fn decode(tokens: &[ExprToken]) -> String {
    tokens.iter().map(ExprToken::decoded).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol_name(expr: &Expr) -> &str {
        match &expr.kind {
            ExprKind::Symbol { name, .. } => name,
            other => panic!("expected a symbol, found {other:?}"),
        }
    }

    #[test]
    fn test_comparison_of_symbols() {
        let rules = Rules::new();
        let expr = parse_with(rules.root, "ABC==XYZ").expect("comparison to parse");

        assert_eq!(
            expr.kind,
            ExprKind::Comparison {
                comparison: ComparisonKind::Equality
            }
        );
        assert_eq!(symbol_name(&expr.children[0]), "ABC");
        assert_eq!(symbol_name(&expr.children[1]), "XYZ");
        assert_eq!(expr.span, 0..8);
    }

    #[test]
    fn test_group_widens_inner_span() {
        let rules = Rules::new();
        let expr = parse_with(rules.root, "( ABC )").expect("group to parse");

        assert_eq!(symbol_name(&expr), "ABC");
        assert_eq!(expr.span, 0..7);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let rules = Rules::new();
        let expr = parse_with(rules.root, "A Or B And C").expect("chain to parse");

        assert_eq!(
            expr.kind,
            ExprKind::Logical {
                operator: LogicalOperator::Or
            }
        );
        assert_eq!(
            expr.children[1].kind,
            ExprKind::Logical {
                operator: LogicalOperator::And
            }
        );
    }

    #[test]
    fn test_metadata_name_after_dangling_period_is_virtual() {
        let rules = Rules::new();
        let expr = parse_with(rules.item_metadata, "%(Foo.)").expect("metadata to parse");

        assert_eq!(expr.children.len(), 2);
        assert_eq!(symbol_name(&expr.children[1]), "");
        assert_eq!(expr.children[1].span, 6..6);
    }

    #[test]
    fn test_numeric_arguments() {
        let rules = Rules::new();
        let expr = parse_with(rules.evaluate, "$(Foo.Substring(1, -2))").expect("call to parse");

        let call = &expr.children[0];
        assert_eq!(call.children.len(), 3);
        assert_eq!(
            call.children[1].kind,
            ExprKind::Number {
                value: "1".to_string()
            }
        );
        assert_eq!(call.children[1].span, 16..17);
        assert_eq!(
            call.children[2].kind,
            ExprKind::Number {
                value: "-2".to_string()
            }
        );
    }

    #[test]
    fn test_decimal_argument() {
        let rules = Rules::new();
        let expr = parse_with(rules.global_call, "Round(0.25)").expect("call to parse");

        assert_eq!(
            expr.children[0].kind,
            ExprKind::Number {
                value: "0.25".to_string()
            }
        );
        assert_eq!(expr.children[0].span, 6..10);
    }

    #[test]
    fn test_numbers_are_not_operands() {
        let rules = Rules::new();
        assert!(parse_with(rules.root, "1 == 2").is_err());
    }

    #[test]
    fn test_simple_list_collects_semicolons() {
        let rules = Rules::new();
        let separators = parse_with(rules.simple_list, "a;b c;;").expect("always parses");

        assert_eq!(separators, vec![1..2, 5..6, 6..7]);
    }
}
