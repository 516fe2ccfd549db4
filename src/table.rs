use crate::model::RowData;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SortSpec {
    pub column: usize,
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: 0,
            ascending: true,
        }
    }
}

/// Display order of the rows under the current sort spec.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    sort: SortSpec,
    order: Vec<usize>,
}

impl TableView {
    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// Points the sort at `name_col_index + column`. Rows are reordered on
    /// the next `refresh`.
    pub fn sort_by(&mut self, name_col_index: usize, column: usize, ascending: bool) {
        self.sort = SortSpec {
            column: name_col_index + column,
            ascending,
        };
    }

    pub fn refresh(&mut self, rows: &[RowData]) {
        let sort = self.sort;
        let mut order = (0..rows.len()).collect::<Vec<_>>();
        order.sort_by(|left, right| {
            let (left, right) = (&rows[*left], &rows[*right]);
            let ordering = compare_cells(
                left.columns.get(sort.column).map(String::as_str),
                right.columns.get(sort.column).map(String::as_str),
            );
            let ordering = if sort.ascending {
                ordering
            } else {
                ordering.reverse()
            };
            ordering.then_with(|| left.path().cmp(&right.path()))
        });
        self.order = order;
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn compare_cells(left: Option<&str>, right: Option<&str>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => match (leading_number(left), leading_number(right)) {
            (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            _ => left
                .to_ascii_lowercase()
                .cmp(&right.to_ascii_lowercase()),
        },
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn leading_number(value: &str) -> Option<f64> {
    let end = value
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(index, _)| index)
        .unwrap_or(value.len());
    value[..end].parse::<f64>().ok()
}
