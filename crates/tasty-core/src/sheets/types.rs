use serde_json::Value;

/// One spreadsheet row. `None` cells are sent as JSON `null` (left blank).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetRow {
    cells: Vec<Option<String>>,
}

impl SheetRow {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    pub fn to_json_values(&self) -> Vec<Value> {
        self.cells
            .iter()
            .map(|c| match c {
                Some(s) => Value::String(s.clone()),
                None => Value::Null,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cells_become_null() {
        let row = SheetRow::new(vec![Some("a".to_string()), None, Some(String::new())]);
        assert_eq!(
            row.to_json_values(),
            vec![
                Value::String("a".to_string()),
                Value::Null,
                Value::String(String::new())
            ]
        );
        assert_eq!(row.cells().len(), 3);
    }
}
