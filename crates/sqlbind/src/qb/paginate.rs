use crate::args::Args;
use crate::value::Value;
use std::fmt::Debug;

/// External pagination capability.
///
/// A paginator writes its own fragment (including the leading space) and may
/// bind values through the statement's argument list.
pub trait Paginator: Debug + Send + Sync {
    fn render(&self, args: &mut Args) -> String;
}

/// Page-number pagination with bound LIMIT/OFFSET parameters.
///
/// `page` is 1-based (clamped to >= 1), `per_page` is clamped to >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub per_page: u64,
}

impl Page {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(&self) -> u64 {
        self.per_page.max(1)
    }

    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }
}

fn bound(n: u64) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

impl Paginator for Page {
    fn render(&self, args: &mut Args) -> String {
        let mut out = String::new();
        if args.dialect().offset_fetch_paging() {
            out.push_str(" OFFSET ");
            args.push_into(&mut out, bound(self.offset()));
            out.push_str(" ROWS FETCH NEXT ");
            args.push_into(&mut out, bound(self.limit()));
            out.push_str(" ROWS ONLY");
        } else {
            out.push_str(" LIMIT ");
            args.push_into(&mut out, bound(self.limit()));
            out.push_str(" OFFSET ");
            args.push_into(&mut out, bound(self.offset()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Postgres, SqlServer};
    use std::sync::Arc;

    #[test]
    fn test_page_binds_limit_then_offset() {
        let mut args = Args::new(Arc::new(Postgres));
        args.add(1);
        assert_eq!(Page::new(3, 20).render(&mut args), " LIMIT $2 OFFSET $3");
        assert_eq!(args.args()[1..], [Value::Int(20), Value::Int(40)]);
    }

    #[test]
    fn test_page_offset_fetch_keeps_text_order() {
        let mut args = Args::new(Arc::new(SqlServer));
        assert_eq!(
            Page::new(2, 10).render(&mut args),
            " OFFSET @p1 ROWS FETCH NEXT @p2 ROWS ONLY"
        );
        assert_eq!(args.args(), &[Value::Int(10), Value::Int(10)]);
    }

    #[test]
    fn test_page_clamps() {
        let page = Page::new(0, 0);
        assert_eq!(page.limit(), 1);
        assert_eq!(page.offset(), 0);
    }
}
