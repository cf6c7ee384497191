mod report_dto;

pub use report_dto::{
    ExportDocumentDto, ExportLineDto, ExportPageDto, FilterQuery, ReportRowDto, SetStatusDto,
};
