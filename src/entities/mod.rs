//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod course;
pub mod course_tag;
pub mod inquiry;
pub mod lesson;
pub mod lesson_progress;
pub mod partner_profile;
pub mod product;
pub mod purchase;
pub mod question;
pub mod referral;
pub mod user;

// Re-export specific types to avoid conflicts
pub use course::{Column as CourseColumn, Entity as Course, Model as CourseModel};
pub use course_tag::{Column as CourseTagColumn, Entity as CourseTag, Model as CourseTagModel};
pub use inquiry::{Column as InquiryColumn, Entity as Inquiry, Model as InquiryModel};
pub use lesson::{Column as LessonColumn, Entity as Lesson, Model as LessonModel};
pub use lesson_progress::{
    Column as LessonProgressColumn, Entity as LessonProgress, Model as LessonProgressModel,
};
pub use partner_profile::{
    Column as PartnerProfileColumn, Entity as PartnerProfile, Model as PartnerProfileModel,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use purchase::{Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel};
pub use question::{Column as QuestionColumn, Entity as Question, Model as QuestionModel};
pub use referral::{Column as ReferralColumn, Entity as Referral, Model as ReferralModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
