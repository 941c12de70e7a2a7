use sqlparser::{
    ast::{
        BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, Ident, SelectItem,
        SetExpr, Statement, TableFactor, UnaryOperator, Value,
    },
    dialect::SQLiteDialect,
    parser::Parser,
};

use crate::planner::{
    command::{Command, Condition, Projection},
    error::PlannerError,
};

/// Turns user input into a [`Command`].
///
/// Dot-commands are matched directly; everything else goes through `sqlparser` and must be
/// a single `SELECT` over one table.
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, input: &str) -> Result<Command, PlannerError> {
        let input = input.trim();
        if input.starts_with('.') {
            return self.parse_dot_command(input);
        }

        let dialect = SQLiteDialect {};
        let statements = Parser::parse_sql(&dialect, input)?;

        if statements.len() != 1 {
            return Err(PlannerError::InvalidQuery(
                "Expected exactly one statement".to_string(),
            ));
        }

        self.to_command(&statements[0])
    }

    fn parse_dot_command(&self, input: &str) -> Result<Command, PlannerError> {
        match input.to_ascii_lowercase().as_str() {
            ".dbinfo" => Ok(Command::DbInfo),
            ".tables" => Ok(Command::Tables),
            _ => Err(PlannerError::UnknownCommand(input.to_string())),
        }
    }

    fn to_command(&self, statement: &Statement) -> Result<Command, PlannerError> {
        let Statement::Query(query) = statement else {
            return Err(PlannerError::UnsupportedStatement(statement.to_string()));
        };
        let SetExpr::Select(select) = query.body.as_ref() else {
            return Err(PlannerError::UnsupportedStatement(query.to_string()));
        };

        let table = match select.from.as_slice() {
            [from] if from.joins.is_empty() => match &from.relation {
                TableFactor::Table { name, .. } => name
                    .0
                    .last()
                    .map(|ident| ident.value.clone())
                    .ok_or_else(|| PlannerError::InvalidQuery("Empty table name".to_string()))?,
                other => return Err(PlannerError::UnsupportedExpression(other.to_string())),
            },
            [] => return Err(PlannerError::InvalidQuery("Missing FROM clause".to_string())),
            _ => {
                return Err(PlannerError::InvalidQuery(
                    "Expected exactly one table".to_string(),
                ));
            }
        };

        if let [SelectItem::UnnamedExpr(expr)] = select.projection.as_slice() {
            if is_count_star(expr) {
                if let Some(selection) = &select.selection {
                    return Err(PlannerError::UnsupportedExpression(format!(
                        "COUNT(*) with WHERE {}",
                        selection
                    )));
                }
                return Ok(Command::Count { table });
            }
        }

        let projection = self.to_projection(&select.projection)?;
        let condition = select
            .selection
            .as_ref()
            .map(|expr| self.to_condition(expr))
            .transpose()?;

        Ok(Command::Select {
            table,
            projection,
            condition,
        })
    }

    fn to_projection(&self, items: &[SelectItem]) -> Result<Projection, PlannerError> {
        if let [SelectItem::Wildcard(_)] = items {
            return Ok(Projection::All);
        }

        let mut columns = Vec::with_capacity(items.len());
        for item in items {
            let expr = match item {
                SelectItem::UnnamedExpr(expr) => expr,
                SelectItem::ExprWithAlias { expr, .. } => expr,
                other => return Err(PlannerError::UnsupportedExpression(other.to_string())),
            };
            columns.push(column_name(expr)?);
        }
        Ok(Projection::Columns(columns))
    }

    fn to_condition(&self, expr: &Expr) -> Result<Condition, PlannerError> {
        match expr {
            Expr::Nested(inner) => self.to_condition(inner),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => Ok(Condition::new(column_name(left)?, literal_text(right)?)),
            other => Err(PlannerError::UnsupportedExpression(other.to_string())),
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_count_star(expr: &Expr) -> bool {
    let Expr::Function(function) = expr else {
        return false;
    };
    let is_count = function
        .name
        .0
        .last()
        .is_some_and(|ident| ident.value.eq_ignore_ascii_case("count"));
    let FunctionArguments::List(list) = &function.args else {
        return false;
    };
    is_count
        && matches!(
            list.args.as_slice(),
            [FunctionArg::Unnamed(FunctionArgExpr::Wildcard)]
        )
}

fn column_name(expr: &Expr) -> Result<String, PlannerError> {
    match expr {
        Expr::Identifier(Ident { value, .. }) => Ok(value.clone()),
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .map(|ident| ident.value.clone())
            .ok_or_else(|| PlannerError::InvalidQuery("Empty column name".to_string())),
        Expr::Nested(inner) => column_name(inner),
        other => Err(PlannerError::UnsupportedExpression(other.to_string())),
    }
}

// Text a literal is compared against. Double-quoted identifiers that name no column are
// string literals in SQLite, so they are accepted too.
fn literal_text(expr: &Expr) -> Result<String, PlannerError> {
    match expr {
        Expr::Value(value) => match value {
            Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => Ok(s.clone()),
            Value::Number(n, _) => Ok(n.to_string()),
            Value::Boolean(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(PlannerError::UnsupportedExpression(other.to_string())),
        },
        Expr::Identifier(Ident { value, .. }) => Ok(value.clone()),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => Ok(format!("-{}", literal_text(expr)?)),
        Expr::Nested(inner) => literal_text(inner),
        other => Err(PlannerError::UnsupportedExpression(other.to_string())),
    }
}
