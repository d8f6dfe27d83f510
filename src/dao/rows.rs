//! Row conversions for the mail table

use crate::model::{Mail, SenderType};
use rusqlite::types::{
    FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef,
};
use rusqlite::Row;

impl ToSql for SenderType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(Value::Integer(i64::from(self.ordinal()))))
    }
}

impl FromSql for SenderType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let ordinal = i32::column_result(value)?;
        SenderType::from_ordinal(ordinal).ok_or(FromSqlError::OutOfRange(i64::from(ordinal)))
    }
}

/// Build a mail from a `RESTORE_MAIL` row; attachments are filled in later
pub(super) fn mail_from_row(message_id: i32, row: &Row<'_>) -> rusqlite::Result<Mail> {
    let mut mail = Mail::new(
        row.get(0)?,
        row.get::<_, String>(1)?,
        row.get(2)?,
        row.get::<_, String>(3)?,
    );
    mail.assign_message_id(message_id);
    mail.expire_time = row.get(4)?;
    mail.topic = row.get(5)?;
    mail.body = row.get(6)?;
    mail.price = row.get(7)?;
    mail.sender_type = row.get(8)?;
    mail.unread = row.get(9)?;
    mail.returnable = row.get(10)?;
    mail.system_msg1 = row.get(11)?;
    mail.system_msg2 = row.get(12)?;
    Ok(mail)
}
