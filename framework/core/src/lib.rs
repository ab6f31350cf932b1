mod file_name;
mod point;
mod store;

pub mod prelude {
    pub use crate::file_name::{ResultFileName, ResultKind};
    pub use crate::point::{ResultTable, ResultTableError, WorkloadPoint};
    pub use crate::store::{format_elapsed, ResultStore, ResultStoreError, RESULT_HEADER};
}
