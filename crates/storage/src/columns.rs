//! Names in the change feed schema model
//!
//! Column, procedure and parameter names are shared between readers and the
//! reference backend so the two can never drift apart.

/// Feed row columns
pub mod column {
    /// BIGINT, strictly increasing feed position
    pub const SEQUENCE: &str = "Sequence";
    /// DATETIMEOFFSET, event wall-clock time
    pub const TIMESTAMP: &str = "Timestamp";
    /// INT, `ChangeFeedAction` code
    pub const ACTION: &str = "Action";
    /// NVARCHAR, tenancy partition (V6 and later)
    pub const PARTITION_NAME: &str = "PartitionName";
    /// VARCHAR, Study Instance UID
    pub const STUDY_INSTANCE_UID: &str = "StudyInstanceUid";
    /// VARCHAR, Series Instance UID
    pub const SERIES_INSTANCE_UID: &str = "SeriesInstanceUid";
    /// VARCHAR, SOP Instance UID
    pub const SOP_INSTANCE_UID: &str = "SopInstanceUid";
    /// BIGINT, watermark written by the event
    pub const ORIGINAL_WATERMARK: &str = "OriginalWatermark";
    /// BIGINT NULL, live watermark of the instance
    pub const CURRENT_WATERMARK: &str = "CurrentWatermark";

    /// INT, number of indexed files
    pub const TOTAL_INDEXED: &str = "TotalIndexedFileCount";
    /// BIGINT, summed content length of indexed files
    pub const TOTAL_SUM: &str = "TotalIndexedBytes";

    /// INT, active schema version
    pub const SCHEMA_VERSION: &str = "Version";
}

/// Stored procedures
pub mod procedure {
    /// Range scan, no partition column
    pub const GET_CHANGE_FEED: &str = "dbo.GetChangeFeed";
    /// Most recent row, no partition column
    pub const GET_CHANGE_FEED_LATEST: &str = "dbo.GetChangeFeedLatest";
    /// Range scan with partition column
    pub const GET_CHANGE_FEED_V6: &str = "dbo.GetChangeFeedV6";
    /// Most recent row with partition column
    pub const GET_CHANGE_FEED_LATEST_V6: &str = "dbo.GetChangeFeedLatestV6";
    /// Range scan filtered by `[@startTime, @endTime)`
    pub const GET_CHANGE_FEED_V35: &str = "dbo.GetChangeFeedV35";
    /// Most recent row, V35 shape
    pub const GET_CHANGE_FEED_LATEST_V35: &str = "dbo.GetChangeFeedLatestV35";
    /// Totals over the file property table
    pub const GET_INDEXED_FILE_METRICS: &str = "dbo.GetIndexedFileMetrics";
    /// Currently applied schema version
    pub const SELECT_CURRENT_SCHEMA_VERSION: &str = "dbo.SelectCurrentSchemaVersion";
}

/// Procedure parameters
pub mod param {
    /// BIGINT, rows to skip
    pub const OFFSET: &str = "@offset";
    /// INT, rows to take
    pub const LIMIT: &str = "@limit";
    /// DATETIMEOFFSET NULL, inclusive lower bound
    pub const START_TIME: &str = "@startTime";
    /// DATETIMEOFFSET NULL, exclusive upper bound
    pub const END_TIME: &str = "@endTime";
}
