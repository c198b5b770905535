use crate::domain::entities::store_event::StoreEvent;

pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: StoreEvent);
}
