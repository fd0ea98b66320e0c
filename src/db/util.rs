/// Helper macro to pass arguments to `query_raw` and similar calls.
///
/// Helps you with casting to `&dyn ToSql` and type inference. Note: use `[]` for
/// the macro invocation, e.g. `dbargs![]`.
macro_rules! dbargs {
    () => {
        [] as [&(dyn postgres_types::ToSql + Sync); 0]
    };
    ($($arg:expr),+ $(,)?) => {
        [$($arg as &(dyn postgres_types::ToSql + Sync)),+]
    };
}

pub(crate) use dbargs;


/// Collects all rows of a `query_raw` result stream into a `Vec`, mapping each
/// row with `from_row`.
pub(crate) async fn collect_rows_mapped<R, F, T, E>(rows: R, from_row: F) -> Result<Vec<T>, E>
where
    R: futures::Stream<Item = Result<tokio_postgres::Row, E>>,
    F: FnMut(tokio_postgres::Row) -> T,
{
    use futures::TryStreamExt;

    rows.map_ok(from_row).try_collect().await
}
