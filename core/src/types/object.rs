use super::{
    AuthorizationState, Chat, Chats, Error, File, Message, Messages, OptionValue, Text, Update,
    Updates, User, Users,
};

crate::td_union! {
    /// Any object the engine may send unprompted or in answer to a request.
    ///
    /// Uncorrelated inbound payloads are decoded as `Object`; a payload whose
    /// `@type` is not covered here is reported as an unknown tag.
    pub enum Object {
        Ok(super::Ok),
        Error(Error),
        Text(Text),
        User(User),
        Users(Users),
        Chat(Chat),
        Chats(Chats),
        Message(Message),
        Messages(Messages),
        File(File),
        OptionValue(OptionValue),
        AuthorizationState(AuthorizationState),
        Update(Update),
        Updates(Updates),
    }
}

impl Object {
    pub fn is_update(&self) -> bool {
        matches!(self, Object::Update(_))
    }

    pub fn as_update(&self) -> Option<&Update> {
        match self {
            Object::Update(update) => Some(update),
            _ => None,
        }
    }

    pub fn into_update(self) -> Option<Update> {
        match self {
            Object::Update(update) => Some(update),
            _ => None,
        }
    }
}
