//! Visitors that rewrite public query keys into internal storage keys.

use tracing::{debug, trace};

use crate::error::ModulationResult;
use crate::modulator::{AppliedModulators, ModulatorSet, Project};
use crate::query::{
    Column, Condition, Expression, Filter, Formula, GroupBy, Operand, QueryExpression, Timeseries,
};

use super::{walk_formula, ConditionVisitor, ExpressionVisitor, DEFAULT_MAX_DEPTH};

/// Rewrites filter conditions whose column matches a modulator.
///
/// A condition `project = "my-proj"` becomes `project_id = 42` when a
/// `project -> project_id` modulator resolves the slug. Conditions whose
/// right-hand side is an expression rather than a scalar are left alone:
/// there is no value to translate.
pub struct ModulatorConditionVisitor<'a> {
    projects: &'a [Project],
    modulators: &'a ModulatorSet,
    applied: AppliedModulators,
    max_depth: usize,
}

impl<'a> ModulatorConditionVisitor<'a> {
    pub fn new(projects: &'a [Project], modulators: &'a ModulatorSet) -> Self {
        Self {
            projects,
            modulators,
            applied: AppliedModulators::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn applied(&self) -> &AppliedModulators {
        &self.applied
    }

    pub fn into_applied(self) -> AppliedModulators {
        self.applied
    }
}

impl ConditionVisitor for ModulatorConditionVisitor<'_> {
    fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn visit_condition(&mut self, condition: &Condition) -> ModulationResult<Condition> {
        let Some(column) = condition.lhs.as_column() else {
            return Ok(condition.clone());
        };
        let Some(modulator) = self.modulators.find(&column.name) else {
            return Ok(condition.clone());
        };

        // IS NULL / IS NOT NULL carry no value; only the key is renamed.
        if condition.op.is_unary() {
            debug!(
                from = modulator.from_key(),
                to = modulator.to_key(),
                op = condition.op.as_str(),
                "modulated unary filter condition"
            );
            self.applied.push(modulator.clone());
            return Ok(Condition {
                lhs: Expression::Column(Column::new(modulator.to_key())),
                op: condition.op,
                rhs: condition.rhs.clone(),
            });
        }

        let Some(value) = condition.rhs.as_scalar() else {
            trace!(key = %column.name, "condition compares against an expression, not modulated");
            return Ok(condition.clone());
        };

        let rhs = modulator.modulate(value, self.projects)?;
        debug!(
            from = modulator.from_key(),
            to = modulator.to_key(),
            value = %value,
            modulated = %rhs,
            "modulated filter condition"
        );
        self.applied.push(modulator.clone());

        Ok(Condition {
            lhs: Expression::Column(Column::new(modulator.to_key())),
            op: condition.op,
            rhs: Operand::Scalar(rhs),
        })
    }
}

/// Rewrites a whole query: filters through [`ModulatorConditionVisitor`],
/// group-by entries inline, and nested formula parameters recursively.
///
/// Every modulator application is recorded; collect the record with
/// [`into_applied`](Self::into_applied) once the visit is done.
pub struct ModulatorVisitor<'a> {
    projects: &'a [Project],
    modulators: &'a ModulatorSet,
    applied: AppliedModulators,
    max_depth: usize,
}

impl<'a> ModulatorVisitor<'a> {
    pub fn new(projects: &'a [Project], modulators: &'a ModulatorSet) -> Self {
        Self {
            projects,
            modulators,
            applied: AppliedModulators::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn applied(&self) -> &AppliedModulators {
        &self.applied
    }

    pub fn into_applied(self) -> AppliedModulators {
        self.applied
    }

    fn modulate_filters(
        &mut self,
        filters: Option<&[Filter]>,
    ) -> ModulationResult<Option<Vec<Filter>>> {
        let mut visitor = ModulatorConditionVisitor::new(self.projects, self.modulators)
            .with_max_depth(self.max_depth);
        let filters = visitor.visit_group(filters)?;
        self.applied.extend(visitor.into_applied());
        Ok(filters)
    }

    fn modulate_groupby(&mut self, groupby: Option<&[GroupBy]>) -> Option<Vec<GroupBy>> {
        groupby.map(|groups| groups.iter().map(|group| self.modulate_group(group)).collect())
    }

    fn modulate_group(&mut self, group: &GroupBy) -> GroupBy {
        let Some(modulator) = self.modulators.find(group.column_name()) else {
            return group.clone();
        };
        debug!(
            from = modulator.from_key(),
            to = modulator.to_key(),
            "modulated group-by"
        );
        self.applied.push(modulator.clone());

        let column = Column::new(modulator.to_key());
        match group {
            GroupBy::Column(_) => GroupBy::Column(column),
            GroupBy::Aliased(aliased) => GroupBy::Aliased(aliased.with_exp(column)),
        }
    }
}

impl ExpressionVisitor for ModulatorVisitor<'_> {
    fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn visit_formula(&mut self, formula: &Formula, depth: usize) -> ModulationResult<Formula> {
        let formula = walk_formula(self, formula, depth)?;
        let filters = self.modulate_filters(formula.filters.as_deref())?;
        let groupby = self.modulate_groupby(formula.groupby.as_deref());
        Ok(formula.with_filters(filters).with_groupby(groupby))
    }

    fn visit_timeseries(&mut self, timeseries: &Timeseries) -> ModulationResult<Timeseries> {
        let filters = self.modulate_filters(timeseries.filters.as_deref())?;
        let groupby = self.modulate_groupby(timeseries.groupby.as_deref());
        Ok(timeseries.clone().with_filters(filters).with_groupby(groupby))
    }
}

/// A rewritten query and the modulators applied to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Modulated {
    pub expression: QueryExpression,
    pub applied: AppliedModulators,
}

/// Rewrite `expression` with `modulators`, resolving values against
/// `projects`.
///
/// Fails with the first error any modulator raises; no partial result is
/// returned.
pub fn modulate_query(
    expression: &QueryExpression,
    projects: &[Project],
    modulators: &ModulatorSet,
) -> ModulationResult<Modulated> {
    let mut visitor = ModulatorVisitor::new(projects, modulators);
    let expression = visitor.visit(expression)?;
    Ok(Modulated {
        expression,
        applied: visitor.into_applied(),
    })
}
