//! DIMACS assembly for cube tasks.
//!
//! The dispatcher ships the base formula body verbatim with every task,
//! together with the cube's unit literals. The worker rebuilds the full
//! DIMACS text that the counter reads from stdin: a `p cnf` header, the base
//! clauses, then one unit clause per cube literal.

use crate::client::Task;

/// Build the DIMACS text for a task.
///
/// The declared clause count is the base count plus one clause per cube
/// literal; the unit clauses are appended in cube order. Purely syntactic:
/// nothing is validated here. A malformed base formula or literal is the
/// dispatcher's responsibility and shows up as a counter error downstream.
pub fn assemble(task: &Task) -> String {
    let total_clauses = task.num_clauses as usize + task.literals.len();

    let mut formula =
        String::with_capacity(task.formula_body.len() + 32 + task.literals.len() * 12);
    formula.push_str(&format!("p cnf {} {}\n", task.num_vars, total_clauses));
    formula.push_str(&task.formula_body);
    if !task.formula_body.ends_with('\n') {
        formula.push('\n');
    }
    for lit in &task.literals {
        formula.push_str(&format!("{} 0\n", lit));
    }
    formula
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(num_vars: u32, num_clauses: u32, literals: Vec<i32>, body: &str) -> Task {
        Task {
            task_id: 7,
            num_vars,
            num_clauses,
            literals,
            formula_body: body.to_string(),
            timeout_sec: 5,
        }
    }

    #[test]
    fn test_header_declares_base_plus_cube_clauses() {
        let formula = assemble(&task(3, 2, vec![1, -2], "1 2 0\n-1 3 0"));
        assert!(formula.starts_with("p cnf 3 4\n"));
    }

    #[test]
    fn test_unit_clauses_in_cube_order() {
        let formula = assemble(&task(4, 2, vec![4, -1, 2], "1 2 0\n-1 3 0"));
        let lines: Vec<&str> = formula.lines().collect();
        assert_eq!(&lines[lines.len() - 3..], &["4 0", "-1 0", "2 0"]);
    }

    #[test]
    fn test_empty_cube_keeps_base_clause_count() {
        let formula = assemble(&task(3, 2, vec![], "1 2 0\n-1 3 0"));
        assert!(formula.starts_with("p cnf 3 2\n"));
        assert_eq!(formula, "p cnf 3 2\n1 2 0\n-1 3 0\n");
    }

    #[test]
    fn test_body_without_trailing_newline_still_separates_units() {
        let formula = assemble(&task(3, 2, vec![1], "1 2 0\n-1 3 0"));
        assert!(formula.contains("-1 3 0\n1 0\n"));
    }

    #[test]
    fn test_body_with_trailing_newline_is_not_doubled() {
        let formula = assemble(&task(3, 2, vec![1], "1 2 0\n-1 3 0\n"));
        assert!(!formula.contains("\n\n"));
    }

    #[test]
    fn test_two_literal_cube_full_assembly() {
        let formula = assemble(&task(3, 2, vec![1, -2], "1 2 0\n-1 3 0"));
        assert_eq!(formula, "p cnf 3 4\n1 2 0\n-1 3 0\n1 0\n-2 0\n");
    }
}
