mod location;
mod report;
mod status;

pub use location::{LocationRef, LocationType};
pub use report::{Report, ReportTable};
pub use status::ReportStatus;
