use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::r#trait::{FrontEnd, FrontEndContext};

pub struct HeadlessFrontEnd {
    context: FrontEndContext,
}

impl HeadlessFrontEnd {
    pub fn new(context: FrontEndContext) -> Self {
        Self { context }
    }

    async fn run_impl(self) -> Result<()> {
        info!("Фоновый режим без иконки в трее");
        println!("USB Monitor: лог пишется в {}", self.context.log_path.display());

        let mut status = self.context.poller.subscribe();
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            info!("Состояние: {}", current);
        }

        debug!("HeadlessFrontEnd завершает работу");
        Ok(())
    }
}

#[async_trait]
impl FrontEnd for HeadlessFrontEnd {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
