mod user_dto;

pub use user_dto::{
    AuthRecordDto, DisableUserDto, EmergencyContactDto, UserCardDto, UserDetailDto,
};
