//! Postgres enum types and their mapping to domain enums.

use leavedesk_core::calendar::{
    HolidayType as CoreHolidayType, OverrideType as CoreOverrideType,
    SaturdayOffPattern as CoreSaturdayOffPattern,
};
use leavedesk_core::leave::LeaveStatus as CoreLeaveStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "saturday_off_pattern")]
pub enum SaturdayOffPattern {
    #[sea_orm(string_value = "NONE")]
    None,
    #[sea_orm(string_value = "SECOND_ONLY")]
    SecondOnly,
    #[sea_orm(string_value = "SECOND_AND_FOURTH")]
    SecondAndFourth,
    #[sea_orm(string_value = "ALL")]
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "holiday_type")]
pub enum HolidayType {
    #[sea_orm(string_value = "SUNDAY")]
    Sunday,
    #[sea_orm(string_value = "SATURDAY")]
    Saturday,
    #[sea_orm(string_value = "SECOND_SATURDAY")]
    SecondSaturday,
    #[sea_orm(string_value = "NATIONAL_HOLIDAY")]
    NationalHoliday,
    #[sea_orm(string_value = "FESTIVAL")]
    Festival,
    #[sea_orm(string_value = "ORGANIZATION_HOLIDAY")]
    OrganizationHoliday,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "override_type")]
pub enum OverrideType {
    #[sea_orm(string_value = "FORCE_WORKING")]
    ForceWorking,
    #[sea_orm(string_value = "FORCE_HOLIDAY")]
    ForceHoliday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_status")]
pub enum LeaveStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl From<SaturdayOffPattern> for CoreSaturdayOffPattern {
    fn from(value: SaturdayOffPattern) -> Self {
        match value {
            SaturdayOffPattern::None => Self::None,
            SaturdayOffPattern::SecondOnly => Self::SecondOnly,
            SaturdayOffPattern::SecondAndFourth => Self::SecondAndFourth,
            SaturdayOffPattern::All => Self::All,
        }
    }
}

impl From<CoreSaturdayOffPattern> for SaturdayOffPattern {
    fn from(value: CoreSaturdayOffPattern) -> Self {
        match value {
            CoreSaturdayOffPattern::None => Self::None,
            CoreSaturdayOffPattern::SecondOnly => Self::SecondOnly,
            CoreSaturdayOffPattern::SecondAndFourth => Self::SecondAndFourth,
            CoreSaturdayOffPattern::All => Self::All,
        }
    }
}

impl From<HolidayType> for CoreHolidayType {
    fn from(value: HolidayType) -> Self {
        match value {
            HolidayType::Sunday => Self::Sunday,
            HolidayType::Saturday => Self::Saturday,
            HolidayType::SecondSaturday => Self::SecondSaturday,
            HolidayType::NationalHoliday => Self::NationalHoliday,
            HolidayType::Festival => Self::Festival,
            HolidayType::OrganizationHoliday => Self::OrganizationHoliday,
            HolidayType::Other => Self::Other,
        }
    }
}

impl From<CoreHolidayType> for HolidayType {
    fn from(value: CoreHolidayType) -> Self {
        match value {
            CoreHolidayType::Sunday => Self::Sunday,
            CoreHolidayType::Saturday => Self::Saturday,
            CoreHolidayType::SecondSaturday => Self::SecondSaturday,
            CoreHolidayType::NationalHoliday => Self::NationalHoliday,
            CoreHolidayType::Festival => Self::Festival,
            CoreHolidayType::OrganizationHoliday => Self::OrganizationHoliday,
            CoreHolidayType::Other => Self::Other,
        }
    }
}

impl From<OverrideType> for CoreOverrideType {
    fn from(value: OverrideType) -> Self {
        match value {
            OverrideType::ForceWorking => Self::ForceWorking,
            OverrideType::ForceHoliday => Self::ForceHoliday,
        }
    }
}

impl From<CoreOverrideType> for OverrideType {
    fn from(value: CoreOverrideType) -> Self {
        match value {
            CoreOverrideType::ForceWorking => Self::ForceWorking,
            CoreOverrideType::ForceHoliday => Self::ForceHoliday,
        }
    }
}

impl From<LeaveStatus> for CoreLeaveStatus {
    fn from(value: LeaveStatus) -> Self {
        match value {
            LeaveStatus::Pending => Self::Pending,
            LeaveStatus::Approved => Self::Approved,
            LeaveStatus::Rejected => Self::Rejected,
            LeaveStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<CoreLeaveStatus> for LeaveStatus {
    fn from(value: CoreLeaveStatus) -> Self {
        match value {
            CoreLeaveStatus::Pending => Self::Pending,
            CoreLeaveStatus::Approved => Self::Approved,
            CoreLeaveStatus::Rejected => Self::Rejected,
            CoreLeaveStatus::Cancelled => Self::Cancelled,
        }
    }
}
